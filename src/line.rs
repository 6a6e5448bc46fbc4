//! Serial gateway line protocol
//!
//! Messages travel between a gateway and its controller as single ASCII lines:
//!
//! ```text
//! node-id;child-sensor-id;command;ack;type;payload\n
//! ```
//!
//! Outgoing lines carry the sender, the is-ack flag and the payload rendered as text (hex pairs
//! for custom payloads). Incoming lines carry the destination and the request-ack flag; the
//! payload is hex decoded for [`Command::Stream`] and taken as text otherwise.
//!
//! Numeric fields are read leniently like C `atoi` and, as with `strtok`, empty fields between
//! consecutive separators are skipped.
use core::fmt;
use core::str::FromStr;
use heapless::String;

use crate::message::payload::{parse_integer, PayloadVec};
use crate::message::{Command, Message, Payload};
use crate::{GATEWAY_ADDRESS, MAX_PAYLOAD, MAX_SEND_LENGTH};

pub const FIELD_SEPARATOR: char = ';';
const MIN_FIELDS: usize = 5;
const MAX_FIELDS: usize = 6;

pub type Line = String<MAX_SEND_LENGTH>;

#[derive(PartialEq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum ParseLineError {
    /// Fewer than the five mandatory fields were present
    MissingFields(usize),
    /// Stream payload is not a sequence of hex pairs
    InvalidHex(base16::DecodeError),
}

impl From<base16::DecodeError> for ParseLineError {
    fn from(e: base16::DecodeError) -> ParseLineError {
        ParseLineError::InvalidHex(e)
    }
}

#[cfg(feature = "std")]
impl fmt::Display for ParseLineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseLineError::MissingFields(found) => write!(
                f,
                "line has {} fields, at least {} are required",
                found, MIN_FIELDS
            ),
            ParseLineError::InvalidHex(e) => write!(f, "invalid stream payload: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseLineError {}

/// Renders the outgoing line, terminated by `\n`
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{};{};{};{};{};",
            self.sender(),
            self.sensor(),
            self.command(),
            self.is_ack() as u8,
            self.message_type()
        )?;
        self.write_payload_text(f)?;
        f.write_str("\n")
    }
}

impl Message {
    /// Outgoing line in a buffer of [`MAX_SEND_LENGTH`] bytes
    pub fn to_line(&self) -> Line {
        let mut line = Line::new();
        // five u8 fields, separators and the longest payload text stay below MAX_SEND_LENGTH
        let _ = fmt::write(&mut line, format_args!("{}", self));
        line
    }

    /// Parses an incoming line into `self`
    ///
    /// On success destination, sensor, command, request-ack, type and payload are taken from the
    /// line, sender and last become [`GATEWAY_ADDRESS`] and the is-ack flag is cleared. Other
    /// header fields are kept. On error `self` is left untouched.
    pub fn parse_line(&mut self, line: &str) -> Result<(), ParseLineError> {
        let mut fields: [&str; MAX_FIELDS] = [""; MAX_FIELDS];
        let mut count = 0;
        for (slot, field) in fields
            .iter_mut()
            .zip(line.split(FIELD_SEPARATOR).filter(|f| !f.is_empty()))
        {
            *slot = field;
            count += 1;
        }
        if count < MIN_FIELDS {
            crate::fmt::debug!("rejecting line with {} fields", count);
            return Err(ParseLineError::MissingFields(count));
        }

        let command = parse_integer(fields[2].as_bytes()) as u8;
        let value = fields[5].trim_end_matches(&['\r', '\n'][..]);
        let payload = if command == u8::from(Command::Stream) {
            Payload::Custom(decode_hex(value)?)
        } else {
            Payload::text(value)
        };

        self.set_destination(parse_integer(fields[0].as_bytes()) as u8)
            .set_sensor(parse_integer(fields[1].as_bytes()) as u8)
            .set_command(command)
            .set_request_ack(parse_integer(fields[3].as_bytes()) != 0)
            .set_type(parse_integer(fields[4].as_bytes()) as u8)
            .set_sender(GATEWAY_ADDRESS)
            .set_last(GATEWAY_ADDRESS)
            .set_ack(false)
            .set_payload(payload);
        crate::fmt::trace!(
            "parsed line for node {} sensor {}",
            self.destination(),
            self.sensor()
        );
        Ok(())
    }
}

impl FromStr for Message {
    type Err = ParseLineError;

    fn from_str(s: &str) -> Result<Self, ParseLineError> {
        let mut msg = Message::new();
        msg.parse_line(s)?;
        Ok(msg)
    }
}

/// Decodes hex pairs, high nibble first; input beyond [`MAX_PAYLOAD`] bytes is dropped
fn decode_hex(hex: &str) -> Result<PayloadVec, ParseLineError> {
    let hex = &hex.as_bytes()[..hex.len().min(2 * MAX_PAYLOAD)];
    let mut decoded = PayloadVec::new();
    decoded
        .resize_default(hex.len() / 2)
        .map_err(|_| base16::DecodeError::InvalidLength { length: hex.len() })?;
    base16::decode_slice(hex, &mut decoded)?;
    Ok(decoded)
}
