//! Typed message payload
//!
//! On the wire the payload is a plain byte buffer whose meaning is selected by the
//! [`PayloadType`](super::header::PayloadType) tag in the header. In memory each tag owns its own
//! typed value, so reading one view out of a value stored as another is an explicit conversion.
//!
//! Getters degrade instead of failing: an exact tag match returns the stored value, a string
//! payload is parsed into the requested number the way C `atoi`/`atof` would, anything else
//! yields zero.
use core::fmt::{self, Write};
use heapless::{String, Vec};

use super::header::PayloadType;
use crate::{MAX_PAYLOAD, MAX_PAYLOAD_TEXT_LENGTH};

/// Float precision is clamped to this many decimals when rendered
pub const MAX_FLOAT_PRECISION: u8 = 8;

pub type PayloadVec = Vec<u8, MAX_PAYLOAD>;
pub type PayloadText = String<MAX_PAYLOAD_TEXT_LENGTH>;

#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum Payload {
    /// Text, kept as bytes so truncation never fails. Reading it back yields the longest valid
    /// UTF-8 prefix.
    String(PayloadVec),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Long32(i32),
    ULong32(u32),
    Float32 {
        value: f32,
        /// decimals to use when the value is rendered as text
        precision: u8,
    },
    Custom(PayloadVec),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::String(Vec::new())
    }
}

/// Copies at most [`MAX_PAYLOAD`] bytes, the rest is silently dropped
pub(crate) fn truncated(bytes: &[u8]) -> PayloadVec {
    let len = bytes.len().min(MAX_PAYLOAD);
    if len < bytes.len() {
        crate::fmt::debug!("payload truncated from {} to {} bytes", bytes.len(), len);
    }
    let mut vec = PayloadVec::new();
    // cannot fail, len is within capacity
    let _ = vec.extend_from_slice(&bytes[..len]);
    vec
}

impl Payload {
    pub fn text(value: &str) -> Self {
        Payload::String(truncated(value.as_bytes()))
    }

    pub fn custom(value: &[u8]) -> Self {
        Payload::Custom(truncated(value))
    }

    pub fn payload_type(&self) -> PayloadType {
        match self {
            Payload::String(_) => PayloadType::String,
            Payload::Byte(_) => PayloadType::Byte,
            Payload::Int16(_) => PayloadType::Int16,
            Payload::UInt16(_) => PayloadType::UInt16,
            Payload::Long32(_) => PayloadType::Long32,
            Payload::ULong32(_) => PayloadType::ULong32,
            Payload::Float32 { .. } => PayloadType::Float32,
            Payload::Custom(_) => PayloadType::Custom,
        }
    }

    /// Number of bytes the payload occupies on the wire
    pub fn len(&self) -> usize {
        match self {
            Payload::String(data) | Payload::Custom(data) => data.len(),
            Payload::Byte(_) => 1,
            Payload::Int16(_) | Payload::UInt16(_) => 2,
            Payload::Long32(_) | Payload::ULong32(_) => 4,
            Payload::Float32 { .. } => 5, // f32 + precision
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Little endian wire representation
    pub fn as_bytes(&self) -> PayloadVec {
        let mut res = PayloadVec::new();
        // none of the pushes can exceed MAX_PAYLOAD
        let _ = match self {
            Payload::String(data) | Payload::Custom(data) => res.extend_from_slice(data),
            Payload::Byte(v) => res.push(*v).map_err(|_| ()),
            Payload::Int16(v) => res.extend_from_slice(&v.to_le_bytes()),
            Payload::UInt16(v) => res.extend_from_slice(&v.to_le_bytes()),
            Payload::Long32(v) => res.extend_from_slice(&v.to_le_bytes()),
            Payload::ULong32(v) => res.extend_from_slice(&v.to_le_bytes()),
            Payload::Float32 { value, precision } => res
                .extend_from_slice(&value.to_le_bytes())
                .and_then(|_| res.push(*precision).map_err(|_| ())),
        };
        res
    }

    /// Builds the payload from its wire bytes
    ///
    /// Fixed width views read missing bytes as zero, `bytes` longer than [`MAX_PAYLOAD`] are
    /// truncated.
    pub fn from_wire(payload_type: PayloadType, bytes: &[u8]) -> Self {
        let mut buf = [0u8; 5];
        let len = bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        match payload_type {
            PayloadType::String => Payload::String(truncated(bytes)),
            PayloadType::Custom => Payload::Custom(truncated(bytes)),
            PayloadType::Byte => Payload::Byte(buf[0]),
            PayloadType::Int16 => Payload::Int16(i16::from_le_bytes([buf[0], buf[1]])),
            PayloadType::UInt16 => Payload::UInt16(u16::from_le_bytes([buf[0], buf[1]])),
            PayloadType::Long32 => {
                Payload::Long32(i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            }
            PayloadType::ULong32 => {
                Payload::ULong32(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            }
            PayloadType::Float32 => Payload::Float32 {
                value: f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
                precision: buf[4],
            },
        }
    }

    /// Text stored in a string payload, `None` for any other type
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::String(data) => Some(utf8_prefix(data)),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&[u8]> {
        match self {
            Payload::Custom(data) => Some(data),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> bool {
        self.to_byte() != 0
    }

    pub fn to_byte(&self) -> u8 {
        match self {
            Payload::Byte(v) => *v,
            Payload::String(data) => parse_integer(data) as u8,
            _ => 0,
        }
    }

    pub fn to_int16(&self) -> i16 {
        match self {
            Payload::Int16(v) => *v,
            Payload::String(data) => parse_integer(data) as i16,
            _ => 0,
        }
    }

    pub fn to_uint16(&self) -> u16 {
        match self {
            Payload::UInt16(v) => *v,
            Payload::String(data) => parse_integer(data) as u16,
            _ => 0,
        }
    }

    pub fn to_long32(&self) -> i32 {
        match self {
            Payload::Long32(v) => *v,
            Payload::String(data) => parse_integer(data) as i32,
            _ => 0,
        }
    }

    pub fn to_ulong32(&self) -> u32 {
        match self {
            Payload::ULong32(v) => *v,
            Payload::String(data) => parse_integer(data) as u32,
            _ => 0,
        }
    }

    pub fn to_float(&self) -> f32 {
        match self {
            Payload::Float32 { value, .. } => *value,
            Payload::String(data) => parse_float(data),
            _ => 0.0,
        }
    }

    /// Renders any payload type as text
    ///
    /// Numbers are decimal, floats fixed point with at most [`MAX_FLOAT_PRECISION`] decimals and
    /// a minimum width of 2, custom payloads are uppercase hex pairs and strings are copied.
    pub fn write_text<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Payload::String(data) => out.write_str(utf8_prefix(data)),
            Payload::Byte(v) => write!(out, "{}", v),
            Payload::Int16(v) => write!(out, "{}", v),
            Payload::UInt16(v) => write!(out, "{}", v),
            Payload::Long32(v) => write!(out, "{}", v),
            Payload::ULong32(v) => write!(out, "{}", v),
            Payload::Float32 { value, precision } => write!(
                out,
                "{:2.*}",
                (*precision).min(MAX_FLOAT_PRECISION) as usize,
                value
            ),
            Payload::Custom(data) => write_hex(data, out),
        }
    }

    /// [`write_text`](Self::write_text) into an owned buffer sized for the longest rendering
    pub fn to_text(&self) -> PayloadText {
        let mut text = PayloadText::new();
        // MAX_PAYLOAD_TEXT_LENGTH fits the hex form of a full payload and any f32 with 8 decimals
        let _ = self.write_text(&mut text);
        text
    }
}

fn utf8_prefix(data: &[u8]) -> &str {
    match core::str::from_utf8(data) {
        Ok(s) => s,
        // valid_up_to guarantees the prefix is valid
        Err(e) => core::str::from_utf8(&data[..e.valid_up_to()]).unwrap_or_default(),
    }
}

pub(crate) fn write_hex<W: Write>(data: &[u8], out: &mut W) -> fmt::Result {
    let mut pair = [0u8; 2];
    for byte in data {
        base16::encode_config_slice(&[*byte], base16::EncodeUpper, &mut pair);
        for c in pair.iter() {
            out.write_char(*c as char)?;
        }
    }
    Ok(())
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|&c| !matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c))
        .unwrap_or(data.len());
    &data[start..]
}

/// Lenient decimal parse following C `atol`
///
/// Leading whitespace and an optional sign are accepted, parsing stops at the first non digit
/// and input without digits gives zero. Overflow wraps, callers truncate to their width.
pub(crate) fn parse_integer(data: &[u8]) -> i64 {
    let data = skip_whitespace(data);
    let (negative, digits) = match data.first() {
        Some(b'-') => (true, &data[1..]),
        Some(b'+') => (false, &data[1..]),
        _ => (false, data),
    };
    let value = digits
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .fold(0i64, |acc, c| {
            acc.wrapping_mul(10).wrapping_add(i64::from(c - b'0'))
        });
    if negative {
        value.wrapping_neg()
    } else {
        value
    }
}

/// Lenient float parse following C `atof`, the longest numeric prefix is used
pub(crate) fn parse_float(data: &[u8]) -> f32 {
    let data = skip_whitespace(data);
    let digits_from = |from: usize| {
        data[from..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count()
    };

    let mut end = 0;
    if matches!(data.first(), Some(b'-') | Some(b'+')) {
        end += 1;
    }
    let integer_digits = digits_from(end);
    end += integer_digits;
    let mut fraction_digits = 0;
    if data.get(end) == Some(&b'.') {
        fraction_digits = digits_from(end + 1);
        if integer_digits + fraction_digits > 0 {
            end += 1 + fraction_digits;
        }
    }
    if integer_digits + fraction_digits == 0 {
        return 0.0;
    }
    if matches!(data.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(data.get(exp_end), Some(b'-') | Some(b'+')) {
            exp_end += 1;
        }
        let exp_digits = digits_from(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    core::str::from_utf8(&data[..end])
        .ok()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(0.0)
}
