//! Packed message header
//!
//! Two bytes carry seven fields:
//!
//! ```text
//! byte 0: | length (5) | signed (1) | version (2) |
//! byte 1: | payload type (3) | is ack (1) | request ack (1) | command (3) |
//! ```
//!
//! Bits are numbered from the least significant one. Setters mask their input to the field width,
//! higher bits are silently discarded.
use core::convert::TryFrom;
#[cfg(feature = "std")]
use core::fmt;

const VERSION_SHIFT: u8 = 0;
const VERSION_WIDTH: u8 = 2;
const SIGNED_SHIFT: u8 = 2;
const LENGTH_SHIFT: u8 = 3;
const LENGTH_WIDTH: u8 = 5;

const COMMAND_SHIFT: u8 = 0;
const COMMAND_WIDTH: u8 = 3;
const REQUEST_ACK_SHIFT: u8 = 3;
const ACK_SHIFT: u8 = 4;
const PAYLOAD_TYPE_SHIFT: u8 = 5;
const PAYLOAD_TYPE_WIDTH: u8 = 3;

#[inline]
const fn get_bits(byte: u8, shift: u8, width: u8) -> u8 {
    (byte >> shift) & ((1 << width) - 1)
}

#[inline]
const fn set_bits(byte: u8, value: u8, shift: u8, width: u8) -> u8 {
    let mask = ((1u8 << width) - 1) << shift;
    (byte & !mask) | ((value << shift) & mask)
}

/// Kind of a message, stored in the 3 bit command field
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
#[repr(u8)]
pub enum Command {
    /// Node presenting its sensors to the controller
    Presentation = 0,
    /// Setting a value
    Set = 1,
    /// Requesting a value
    Req = 2,
    /// Library internal traffic
    Internal = 3,
    /// Raw data stream, e.g. firmware upgrade blocks
    Stream = 4,
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Command::Presentation),
            1 => Ok(Command::Set),
            2 => Ok(Command::Req),
            3 => Ok(Command::Internal),
            4 => Ok(Command::Stream),
            _ => Err("Unknown Command"),
        }
    }
}

#[cfg(feature = "std")]
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Command::Presentation => write!(f, "presentation"),
            Command::Set => write!(f, "set"),
            Command::Req => write!(f, "req"),
            Command::Internal => write!(f, "internal"),
            Command::Stream => write!(f, "stream"),
        }
    }
}

/// Tag selecting the valid interpretation of the payload
///
/// All eight values of the 3 bit field are assigned, so every header decodes to a tag.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
#[repr(u8)]
pub enum PayloadType {
    String = 0,
    Byte = 1,
    Int16 = 2,
    UInt16 = 3,
    Long32 = 4,
    ULong32 = 5,
    Custom = 6,
    Float32 = 7,
}

impl PayloadType {
    /// Decodes the tag from its field value, bits above the field width are ignored
    pub const fn from_bits(bits: u8) -> PayloadType {
        match bits & 0b111 {
            0 => PayloadType::String,
            1 => PayloadType::Byte,
            2 => PayloadType::Int16,
            3 => PayloadType::UInt16,
            4 => PayloadType::Long32,
            5 => PayloadType::ULong32,
            6 => PayloadType::Custom,
            _ => PayloadType::Float32,
        }
    }
}

impl From<PayloadType> for u8 {
    fn from(payload_type: PayloadType) -> u8 {
        payload_type as u8
    }
}

/// The two packed header bytes
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct Header {
    version_length: u8,
    command_ack_payload: u8,
}

impl Header {
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            version_length: bytes[0],
            command_ack_payload: bytes[1],
        }
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        [self.version_length, self.command_ack_payload]
    }

    pub const fn version(&self) -> u8 {
        get_bits(self.version_length, VERSION_SHIFT, VERSION_WIDTH)
    }

    pub fn set_version(&mut self, version: u8) {
        self.version_length = set_bits(self.version_length, version, VERSION_SHIFT, VERSION_WIDTH);
    }

    pub const fn is_signed(&self) -> bool {
        get_bits(self.version_length, SIGNED_SHIFT, 1) != 0
    }

    pub fn set_signed(&mut self, signed: bool) {
        self.version_length = set_bits(self.version_length, signed as u8, SIGNED_SHIFT, 1);
    }

    pub const fn length(&self) -> u8 {
        get_bits(self.version_length, LENGTH_SHIFT, LENGTH_WIDTH)
    }

    /// Stores the raw 5 bit length, capacity is checked by the payload setters
    pub fn set_length(&mut self, length: u8) {
        self.version_length = set_bits(self.version_length, length, LENGTH_SHIFT, LENGTH_WIDTH);
    }

    pub const fn command(&self) -> u8 {
        get_bits(self.command_ack_payload, COMMAND_SHIFT, COMMAND_WIDTH)
    }

    pub fn set_command(&mut self, command: u8) {
        self.command_ack_payload =
            set_bits(self.command_ack_payload, command, COMMAND_SHIFT, COMMAND_WIDTH);
    }

    pub const fn request_ack(&self) -> bool {
        get_bits(self.command_ack_payload, REQUEST_ACK_SHIFT, 1) != 0
    }

    pub fn set_request_ack(&mut self, request_ack: bool) {
        self.command_ack_payload =
            set_bits(self.command_ack_payload, request_ack as u8, REQUEST_ACK_SHIFT, 1);
    }

    pub const fn is_ack(&self) -> bool {
        get_bits(self.command_ack_payload, ACK_SHIFT, 1) != 0
    }

    pub fn set_ack(&mut self, ack: bool) {
        self.command_ack_payload = set_bits(self.command_ack_payload, ack as u8, ACK_SHIFT, 1);
    }

    pub const fn payload_type(&self) -> PayloadType {
        PayloadType::from_bits(get_bits(
            self.command_ack_payload,
            PAYLOAD_TYPE_SHIFT,
            PAYLOAD_TYPE_WIDTH,
        ))
    }

    pub fn set_payload_type(&mut self, payload_type: PayloadType) {
        self.command_ack_payload = set_bits(
            self.command_ack_payload,
            payload_type as u8,
            PAYLOAD_TYPE_SHIFT,
            PAYLOAD_TYPE_WIDTH,
        );
    }
}
