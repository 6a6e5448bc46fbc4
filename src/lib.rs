//! Message codec for MySensors style sensor networks
//!
//! A [`Message`](message::Message) is exchanged between a node and a gateway either as raw bytes
//! over a radio link or as an ASCII line over a serial link to the controller. The
//! [`message`] module contains the packed header, the typed payload and the binary forms, the
//! [`line`] module the serial line protocol.
//!
//! Nothing here allocates or fails hard: oversized payloads are truncated and reading a payload
//! as the wrong type degrades to a parsed or zero value.

#![cfg_attr(any(not(feature = "std"), not(test)), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub(crate) mod fmt;

pub mod line;
pub mod message;

// include defmt::Format implementations
// we don't want them derive()d in the modules unless defmt-impl feature is set
#[cfg(feature = "defmt-impl")]
pub mod defmt;

// reexport heapless
pub use heapless;

/// Protocol version stamped into every new message
pub const PROTOCOL_VERSION: u8 = 2;
/// Largest radio frame, routed header included
pub const MAX_MESSAGE_LENGTH: usize = 32;
/// last, sender, destination, 2 header bytes, type, sensor
pub const ROUTED_HEADER_SIZE: usize = 7;
/// 2 header bytes, type, sensor
pub const HEADER_SIZE: usize = 4;
/// Payload capacity of a radio frame
pub const MAX_PAYLOAD: usize = MAX_MESSAGE_LENGTH - ROUTED_HEADER_SIZE;
/// Text form of the largest payload: hex pairs of a full custom payload plus one spare byte
pub const MAX_PAYLOAD_TEXT_LENGTH: usize = 2 * MAX_PAYLOAD + 1;
/// Capacity of an outgoing serial line
pub const MAX_SEND_LENGTH: usize = 144;
/// Node id of the gateway, used as origin of messages parsed from serial lines
pub const GATEWAY_ADDRESS: u8 = 0;
