//! Node / gateway message
//!
//! A [`Message`] carries routing bytes, the packed [`Header`], the application `type` and
//! `sensor` bytes and a typed [`Payload`]. The payload type and length header fields always
//! describe the current payload; they are updated by every payload setter and cannot be set on
//! their own.
//!
//! Two binary forms are supported:
//!
//! * [`Message::as_bytes`] - 2 header bytes, type, sensor, payload
//! * [`Message::as_routed_bytes`] - last, sender, destination followed by the above, as carried
//!   in a radio frame
use core::convert::TryFrom;

use heapless::Vec;

pub mod header;
pub mod payload;

pub use header::{Command, Header, PayloadType};
pub use payload::{Payload, PayloadText, PayloadVec};

use crate::{HEADER_SIZE, MAX_MESSAGE_LENGTH, MAX_PAYLOAD, PROTOCOL_VERSION, ROUTED_HEADER_SIZE};

pub type MessageVec = Vec<u8, MAX_MESSAGE_LENGTH>;

#[derive(PartialEq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum Error {
    /// Buffer is shorter than the fixed header
    MalformedMessage,
    /// Header declares more payload bytes than the buffer holds
    PayloadTooShort { declared: usize, available: usize },
}

#[cfg(feature = "std")]
impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::MalformedMessage => write!(f, "message is shorter than its header"),
            Error::PayloadTooShort {
                declared,
                available,
            } => write!(
                f,
                "header declares {} payload bytes but only {} are present",
                declared, available
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Sensor / actuator message exchanged between a node and a gateway
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct Message {
    last: u8,
    sender: u8,
    destination: u8,
    header: Header,
    message_type: u8,
    sensor: u8,
    payload: Payload,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::len_without_is_empty)]
impl Message {
    /// Empty message, all fields zero apart from the protocol version
    pub fn new() -> Self {
        let mut header = Header::default();
        header.set_version(PROTOCOL_VERSION);
        Self {
            last: 0,
            sender: 0,
            destination: 0,
            header,
            message_type: 0,
            sensor: 0,
            payload: Payload::default(),
        }
    }

    pub fn with_sensor(sensor: u8, message_type: u8) -> Self {
        let mut msg = Self::new();
        msg.sensor = sensor;
        msg.message_type = message_type;
        msg
    }

    /// Message with routing and header prefilled and an empty string payload
    ///
    /// `ack` marks the message as an acknowledgement.
    pub fn with_header(
        sender: u8,
        sensor: u8,
        command: impl Into<u8>,
        ack: bool,
        message_type: u8,
    ) -> Self {
        let mut msg = Self::new();
        msg.sender = sender;
        msg.sensor = sensor;
        msg.header.set_command(command.into());
        msg.header.set_ack(ack);
        msg.message_type = message_type;
        msg.set_payload(Payload::default());
        msg
    }

    /// Resets every field, header included, and stamps the protocol version again
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn last(&self) -> u8 {
        self.last
    }

    pub fn set_last(&mut self, last: u8) -> &mut Self {
        self.last = last;
        self
    }

    pub fn sender(&self) -> u8 {
        self.sender
    }

    pub fn set_sender(&mut self, sender: u8) -> &mut Self {
        self.sender = sender;
        self
    }

    pub fn destination(&self) -> u8 {
        self.destination
    }

    pub fn set_destination(&mut self, destination: u8) -> &mut Self {
        self.destination = destination;
        self
    }

    /// Application defined sub type, e.g. temperature or humidity
    pub fn message_type(&self) -> u8 {
        self.message_type
    }

    pub fn set_type(&mut self, message_type: u8) -> &mut Self {
        self.message_type = message_type;
        self
    }

    pub fn sensor(&self) -> u8 {
        self.sensor
    }

    pub fn set_sensor(&mut self, sensor: u8) -> &mut Self {
        self.sensor = sensor;
        self
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn version(&self) -> u8 {
        self.header.version()
    }

    pub fn is_signed(&self) -> bool {
        self.header.is_signed()
    }

    pub fn set_signed(&mut self, signed: bool) -> &mut Self {
        self.header.set_signed(signed);
        self
    }

    /// Raw 3 bit command value, see [`Command`] for the known kinds
    pub fn command(&self) -> u8 {
        self.header.command()
    }

    pub fn set_command(&mut self, command: impl Into<u8>) -> &mut Self {
        self.header.set_command(command.into());
        self
    }

    pub fn request_ack(&self) -> bool {
        self.header.request_ack()
    }

    pub fn set_request_ack(&mut self, request_ack: bool) -> &mut Self {
        self.header.set_request_ack(request_ack);
        self
    }

    /// True when this message is itself an acknowledgement
    pub fn is_ack(&self) -> bool {
        self.header.is_ack()
    }

    pub fn set_ack(&mut self, ack: bool) -> &mut Self {
        self.header.set_ack(ack);
        self
    }

    pub fn payload_type(&self) -> PayloadType {
        self.header.payload_type()
    }

    pub fn payload_length(&self) -> u8 {
        self.header.length()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Installs a payload, updating the type and length header fields first
    pub fn set_payload(&mut self, payload: Payload) -> &mut Self {
        self.header.set_payload_type(payload.payload_type());
        // payloads never exceed MAX_PAYLOAD, which fits the 5 bit field
        self.header.set_length(payload.len() as u8);
        self.payload = payload;
        self
    }

    pub fn set_bool(&mut self, value: bool) -> &mut Self {
        self.set_payload(Payload::Byte(value as u8))
    }

    pub fn set_byte(&mut self, value: u8) -> &mut Self {
        self.set_payload(Payload::Byte(value))
    }

    pub fn set_int16(&mut self, value: i16) -> &mut Self {
        self.set_payload(Payload::Int16(value))
    }

    pub fn set_uint16(&mut self, value: u16) -> &mut Self {
        self.set_payload(Payload::UInt16(value))
    }

    pub fn set_long32(&mut self, value: i32) -> &mut Self {
        self.set_payload(Payload::Long32(value))
    }

    pub fn set_ulong32(&mut self, value: u32) -> &mut Self {
        self.set_payload(Payload::ULong32(value))
    }

    /// Float with the number of decimals to use when it is rendered as text
    pub fn set_float(&mut self, value: f32, precision: u8) -> &mut Self {
        self.set_payload(Payload::Float32 { value, precision })
    }

    /// Raw bytes, anything beyond [`MAX_PAYLOAD`] is silently dropped
    pub fn set_custom(&mut self, value: &[u8]) -> &mut Self {
        self.set_payload(Payload::custom(value))
    }

    /// Text, anything beyond [`MAX_PAYLOAD`] bytes is silently dropped
    pub fn set_str(&mut self, value: &str) -> &mut Self {
        self.set_payload(Payload::text(value))
    }

    /// Presentation record: library version followed by the sensor type hint
    pub fn set_presentation(&mut self, library_version: u8, sensor_type: u8) -> &mut Self {
        self.set_custom(&[library_version, sensor_type])
    }

    pub fn get_bool(&self) -> bool {
        self.payload.to_bool()
    }

    pub fn get_byte(&self) -> u8 {
        self.payload.to_byte()
    }

    pub fn get_int16(&self) -> i16 {
        self.payload.to_int16()
    }

    pub fn get_uint16(&self) -> u16 {
        self.payload.to_uint16()
    }

    pub fn get_long32(&self) -> i32 {
        self.payload.to_long32()
    }

    pub fn get_ulong32(&self) -> u32 {
        self.payload.to_ulong32()
    }

    pub fn get_float(&self) -> f32 {
        self.payload.to_float()
    }

    /// Decimals stored with a float payload
    pub fn get_float_precision(&self) -> Option<u8> {
        match self.payload {
            Payload::Float32 { precision, .. } => Some(precision),
            _ => None,
        }
    }

    /// Text of a string payload, `None` when the payload is of any other type
    pub fn get_str(&self) -> Option<&str> {
        self.payload.as_str()
    }

    /// Bytes of a custom payload
    pub fn get_custom(&self) -> Option<&[u8]> {
        self.payload.as_custom()
    }

    /// `(library version, sensor type)` read from a custom payload of at least two bytes
    pub fn get_presentation(&self) -> Option<(u8, u8)> {
        match self.payload.as_custom() {
            Some([version, sensor_type, ..]) => Some((*version, *sensor_type)),
            _ => None,
        }
    }

    /// Payload of any type rendered as text into a caller supplied writer
    pub fn write_payload_text<W: core::fmt::Write>(&self, out: &mut W) -> core::fmt::Result {
        self.payload.write_text(out)
    }

    /// Payload of any type rendered as text
    pub fn payload_text(&self) -> PayloadText {
        self.payload.to_text()
    }

    /// Hex pairs of the payload bytes when the command is [`Command::Stream`]
    pub fn stream_text(&self) -> Option<PayloadText> {
        if self.command() != u8::from(Command::Stream) {
            return None;
        }
        let mut text = PayloadText::new();
        // the hex form of MAX_PAYLOAD bytes fits PayloadText
        let _ = payload::write_hex(&self.payload.as_bytes(), &mut text);
        Some(text)
    }

    pub fn len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// 2 header bytes, type, sensor and payload
    pub fn as_bytes(&self) -> MessageVec {
        let mut res = MessageVec::new();
        // HEADER_SIZE + MAX_PAYLOAD is below MAX_MESSAGE_LENGTH
        let _ = res
            .extend_from_slice(&self.header.to_bytes())
            .and_then(|_| res.extend_from_slice(&[self.message_type, self.sensor]))
            .and_then(|_| res.extend_from_slice(&self.payload.as_bytes()));
        res
    }

    /// Radio frame: last, sender, destination and then [`as_bytes`](Self::as_bytes)
    pub fn as_routed_bytes(&self) -> MessageVec {
        let mut res = MessageVec::new();
        // ROUTED_HEADER_SIZE + MAX_PAYLOAD == MAX_MESSAGE_LENGTH
        let _ = res
            .extend_from_slice(&[self.last, self.sender, self.destination])
            .and_then(|_| res.extend_from_slice(&self.as_bytes()));
        res
    }

    /// Decodes a radio frame produced by [`as_routed_bytes`](Self::as_routed_bytes)
    pub fn try_from_routed(buf: &[u8]) -> Result<Message, Error> {
        if buf.len() < ROUTED_HEADER_SIZE {
            return Err(Error::MalformedMessage);
        }
        let mut msg = Message::try_from(&buf[3..])?;
        msg.last = buf[0];
        msg.sender = buf[1];
        msg.destination = buf[2];
        Ok(msg)
    }
}

impl TryFrom<&[u8]> for Message {
    type Error = Error;

    /// Routing bytes of the decoded message are zero. A declared length above [`MAX_PAYLOAD`] is
    /// clamped, bytes after the payload are ignored.
    ///
    /// For fixed width payload types the length field is rewritten to the width of the type, so
    /// re-encoding a header that declared another length does not reproduce the input bytes.
    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::MalformedMessage);
        }
        let header = Header::from_bytes([buf[0], buf[1]]);
        let declared = (header.length() as usize).min(MAX_PAYLOAD);
        let available = buf.len() - HEADER_SIZE;
        if available < declared {
            return Err(Error::PayloadTooShort {
                declared,
                available,
            });
        }

        let mut msg = Message::new();
        msg.header = header;
        msg.message_type = buf[2];
        msg.sensor = buf[3];
        let payload = Payload::from_wire(
            header.payload_type(),
            &buf[HEADER_SIZE..HEADER_SIZE + declared],
        );
        msg.set_payload(payload);
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, Rng};

    #[test]
    fn test_new_is_reset() {
        let msg = Message::new();
        assert_eq!(msg.version(), PROTOCOL_VERSION);
        assert_eq!(msg.payload_length(), 0);
        assert_eq!(msg.payload_type(), PayloadType::String);
        assert_eq!(msg.command(), 0);
        assert!(!msg.is_ack());
        assert!(!msg.request_ack());
        assert!(!msg.is_signed());
        assert_eq!(msg.as_bytes().as_slice(), &[0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_with_header() {
        let msg = Message::with_header(5, 2, Command::Set, true, 1);
        assert_eq!(msg.sender(), 5);
        assert_eq!(msg.sensor(), 2);
        assert_eq!(msg.command(), 1);
        assert!(msg.is_ack());
        assert!(!msg.request_ack());
        assert_eq!(msg.message_type(), 1);
        assert_eq!(msg.get_str(), Some(""));
        assert_eq!(msg.to_line(), "5;2;1;1;1;\n");

        let msg = Message::with_header(5, 2, Command::Set, false, 1);
        assert!(!msg.is_ack());
        assert_eq!(msg.to_line(), "5;2;1;0;1;\n");
    }

    #[test]
    fn test_decode_rewrites_length_to_type_width() {
        // uint16 payload declaring 3 bytes
        let buf = [0b0001_1010, 0b0110_0001, 0x00, 0x00, 0x01, 0x02, 0x03];
        let msg = Message::try_from(&buf[..]).unwrap();
        assert_eq!(msg.get_uint16(), 0x0201);
        assert_eq!(msg.payload_length(), 2);
        assert_eq!(
            msg.as_bytes().as_slice(),
            &[0b0001_0010, 0b0110_0001, 0x00, 0x00, 0x01, 0x02]
        );
    }

    #[test]
    fn test_clear() {
        let mut msg = Message::with_sensor(3, 4);
        msg.set_signed(true).set_destination(9).set_ulong32(7);
        msg.clear();
        assert_eq!(msg, Message::new());
    }

    #[test]
    fn test_setters_set_type_and_length() {
        let mut msg = Message::new();

        msg.set_bool(true);
        assert_eq!(msg.payload_type(), PayloadType::Byte);
        assert_eq!(msg.payload_length(), 1);
        assert!(msg.get_bool());
        assert_eq!(msg.get_byte(), 1);

        msg.set_byte(0xab);
        assert_eq!(msg.payload_type(), PayloadType::Byte);
        assert_eq!(msg.payload_length(), 1);
        assert_eq!(msg.get_byte(), 0xab);

        msg.set_int16(-12345);
        assert_eq!(msg.payload_type(), PayloadType::Int16);
        assert_eq!(msg.payload_length(), 2);
        assert_eq!(msg.get_int16(), -12345);

        msg.set_uint16(54321);
        assert_eq!(msg.payload_type(), PayloadType::UInt16);
        assert_eq!(msg.payload_length(), 2);
        assert_eq!(msg.get_uint16(), 54321);

        msg.set_long32(-7_000_000);
        assert_eq!(msg.payload_type(), PayloadType::Long32);
        assert_eq!(msg.payload_length(), 4);
        assert_eq!(msg.get_long32(), -7_000_000);

        msg.set_ulong32(4_000_000_000);
        assert_eq!(msg.payload_type(), PayloadType::ULong32);
        assert_eq!(msg.payload_length(), 4);
        assert_eq!(msg.get_ulong32(), 4_000_000_000);

        msg.set_float(21.75, 2);
        assert_eq!(msg.payload_type(), PayloadType::Float32);
        assert_eq!(msg.payload_length(), 5);
        assert_eq!(msg.get_float(), 21.75);
        assert_eq!(msg.get_float_precision(), Some(2));

        msg.set_custom(&[0xde, 0xad]);
        assert_eq!(msg.payload_type(), PayloadType::Custom);
        assert_eq!(msg.payload_length(), 2);
        assert_eq!(msg.get_custom(), Some(&[0xde, 0xad][..]));

        msg.set_str("on");
        assert_eq!(msg.payload_type(), PayloadType::String);
        assert_eq!(msg.payload_length(), 2);
        assert_eq!(msg.get_str(), Some("on"));
    }

    #[test]
    fn test_setters_chain() {
        let mut msg = Message::new();
        msg.set_sensor(1).set_type(2).set_destination(3).set_int16(4);
        assert_eq!(
            (msg.sensor(), msg.message_type(), msg.destination()),
            (1, 2, 3)
        );
        assert_eq!(msg.get_int16(), 4);
    }

    #[test]
    fn test_text_coerces_to_every_number() {
        let mut msg = Message::new();
        msg.set_str("117");
        assert_eq!(msg.get_byte(), 117);
        assert_eq!(msg.get_int16(), 117);
        assert_eq!(msg.get_uint16(), 117);
        assert_eq!(msg.get_long32(), 117);
        assert_eq!(msg.get_ulong32(), 117);
        assert_eq!(msg.get_float(), 117.0);
        assert!(msg.get_bool());
    }

    #[test]
    fn test_byte_does_not_reinterpret() {
        let mut msg = Message::new();
        msg.set_byte(0x41);
        assert_eq!(msg.get_float(), 0.0);
        assert_eq!(msg.get_long32(), 0);
        assert_eq!(msg.get_str(), None);
        assert_eq!(msg.get_custom(), None);
    }

    #[test]
    fn test_custom_truncates_to_capacity() {
        let mut arr = [0u8; MAX_PAYLOAD + 10];
        thread_rng().fill(&mut arr[..]);

        let mut msg = Message::new();
        msg.set_custom(&arr);
        assert_eq!(msg.payload_length() as usize, MAX_PAYLOAD);
        assert_eq!(msg.get_custom(), Some(&arr[..MAX_PAYLOAD]));
    }

    #[test]
    fn test_text_truncates_to_capacity() {
        let mut msg = Message::new();
        msg.set_str("abcdefghijklmnopqrstuvwxyz0123456789");
        assert_eq!(msg.payload_length() as usize, MAX_PAYLOAD);
        assert_eq!(msg.get_str(), Some("abcdefghijklmnopqrstuvwxy"));
    }

    #[test]
    fn test_presentation_record() {
        let mut msg = Message::with_header(1, 0, Command::Presentation, false, 6);
        msg.set_presentation(2, 17);
        assert_eq!(msg.get_presentation(), Some((2, 17)));

        msg.set_custom(&[1]);
        assert_eq!(msg.get_presentation(), None);
        msg.set_byte(1);
        assert_eq!(msg.get_presentation(), None);
    }

    #[test]
    fn test_stream_text_requires_stream_command() {
        let mut msg = Message::with_header(0, 0, Command::Stream, false, 0);
        msg.set_custom(&[0x1a, 0xff]);
        assert_eq!(msg.stream_text().as_deref(), Some("1AFF"));

        msg.set_command(Command::Set);
        assert_eq!(msg.stream_text(), None);
    }

    #[test]
    fn test_as_bytes_layout() {
        let mut msg = Message::with_header(0, 3, Command::Set, false, 0x26);
        msg.set_int16(0x0102);
        assert_eq!(
            msg.as_bytes().as_slice(),
            &[0b0001_0010, 0b0100_0001, 0x26, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_binary_roundtrip() {
        let mut msg = Message::with_header(0, 7, Command::Set, true, 0);
        msg.set_float(-3.5, 1).set_signed(true);
        let decoded = Message::try_from(msg.as_bytes().as_slice()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_routed_roundtrip() {
        let mut msg = Message::with_header(12, 7, Command::Internal, false, 3);
        msg.set_last(4).set_destination(0).set_str("hello");
        let bytes = msg.as_routed_bytes();
        assert_eq!(bytes.len(), ROUTED_HEADER_SIZE + 5);
        assert_eq!(&bytes[..3], &[4, 12, 0]);
        assert_eq!(Message::try_from_routed(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_decode_short_buffers() {
        assert_eq!(
            Message::try_from(&[0x02, 0x00, 0x00][..]),
            Err(Error::MalformedMessage)
        );
        assert_eq!(
            Message::try_from_routed(&[0x00; 6][..]),
            Err(Error::MalformedMessage)
        );
        // length 3, one payload byte present
        assert_eq!(
            Message::try_from(&[0b0001_1010, 0x00, 0x00, 0x00, b'a'][..]),
            Err(Error::PayloadTooShort {
                declared: 3,
                available: 1
            })
        );
    }

    #[test]
    fn test_decode_clamps_length_to_capacity() {
        let mut buf = [b'x'; HEADER_SIZE + 31];
        // version 2, length 31, string payload, set command
        buf[0] = 0b1111_1010;
        buf[1] = 0b0000_0001;
        let msg = Message::try_from(&buf[..]).unwrap();
        assert_eq!(msg.payload_length() as usize, MAX_PAYLOAD);
        assert_eq!(msg.get_str().map(str::len), Some(MAX_PAYLOAD));
    }
}
