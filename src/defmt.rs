use defmt::Formatter;

use crate::line::ParseLineError;
use crate::message::{Command, Error as MessageError, Message, PayloadType};

impl defmt::Format for Message {
    fn format(&self, fmt: Formatter<'_>) {
        defmt::write!(
            fmt,
            "Message {{ sender: {=u8}, destination: {=u8}, sensor: {=u8}, command: {=u8}, type: {=u8}, payload: {=str} }}",
            self.sender(),
            self.destination(),
            self.sensor(),
            self.command(),
            self.message_type(),
            self.payload_text().as_str()
        )
    }
}

impl defmt::Format for Command {
    fn format(&self, fmt: Formatter<'_>) {
        defmt::write!(fmt, "Command({=u8})", *self as u8)
    }
}

impl defmt::Format for PayloadType {
    fn format(&self, fmt: Formatter<'_>) {
        defmt::write!(fmt, "PayloadType({=u8})", *self as u8)
    }
}

impl defmt::Format for MessageError {
    fn format(&self, fmt: Formatter<'_>) {
        match self {
            MessageError::MalformedMessage => defmt::write!(fmt, "MalformedMessage"),
            MessageError::PayloadTooShort {
                declared,
                available,
            } => defmt::write!(
                fmt,
                "PayloadTooShort {{ declared: {=usize}, available: {=usize} }}",
                *declared,
                *available
            ),
        }
    }
}

impl defmt::Format for ParseLineError {
    fn format(&self, fmt: Formatter<'_>) {
        match self {
            ParseLineError::MissingFields(found) => {
                defmt::write!(fmt, "MissingFields({=usize})", *found)
            }
            ParseLineError::InvalidHex(_) => defmt::write!(fmt, "InvalidHex"),
        }
    }
}
