//! Recursive-descent parser for the DMAP tagged binary format
//!
//! Wire format: 8-byte headers of `[4-byte code][4-byte big-endian length]`
//! followed by exactly `length` payload bytes, recursively for container
//! codes. Every declared length must bound its payload exactly; anything
//! inconsistent with the remaining buffer is a [`DmapError`], never a panic.

use byteorder::{BigEndian, ByteOrder};

use super::codes::{ContentCodeRegistry, ContentType};
use super::value::{DmapItem, DmapValue};
use crate::error::DmapError;
use crate::protocol::dmap::ContentCode;

/// Containers nested deeper than this are rejected rather than risking the
/// stack on crafted input.
const MAX_DEPTH: usize = 32;

/// Parse a complete buffer into a sequence of top-level content nodes
///
/// # Errors
///
/// Returns [`DmapError`] if the buffer is truncated, a declared length
/// overruns the remaining bytes, a fixed-size payload has the wrong size,
/// or a string payload is not UTF-8.
pub fn parse(buf: &[u8], registry: &ContentCodeRegistry) -> Result<Vec<DmapItem>, DmapError> {
    parse_sequence(buf, registry, 0)
}

fn parse_sequence(
    mut buf: &[u8],
    registry: &ContentCodeRegistry,
    depth: usize,
) -> Result<Vec<DmapItem>, DmapError> {
    if depth > MAX_DEPTH {
        return Err(DmapError::NestingTooDeep { limit: MAX_DEPTH });
    }

    let mut items = Vec::new();

    while !buf.is_empty() {
        if buf.len() < 8 {
            return Err(DmapError::Truncated {
                needed: 8 - buf.len(),
            });
        }

        let code = ContentCode([buf[0], buf[1], buf[2], buf[3]]);
        let declared = BigEndian::read_u32(&buf[4..8]) as usize;
        buf = &buf[8..];

        if declared > buf.len() {
            return Err(DmapError::LengthOverrun {
                code: code.to_string(),
                declared,
                available: buf.len(),
            });
        }

        let payload = &buf[..declared];
        buf = &buf[declared..];

        let value = decode_payload(code, payload, registry, depth)?;
        items.push(DmapItem { code, value });
    }

    Ok(items)
}

fn decode_payload(
    code: ContentCode,
    payload: &[u8],
    registry: &ContentCodeRegistry,
    depth: usize,
) -> Result<DmapValue, DmapError> {
    let wrong_size = || DmapError::InvalidPayloadSize {
        code: code.to_string(),
        size: payload.len(),
    };
    let exact = |n: usize| {
        if payload.len() == n {
            Ok(())
        } else {
            Err(wrong_size())
        }
    };

    let value = match registry.lookup(code) {
        ContentType::U8 => {
            let [b] = payload else { return Err(wrong_size()) };
            DmapValue::U8(*b)
        }
        ContentType::I8 => {
            let [b] = payload else { return Err(wrong_size()) };
            DmapValue::I8(i8::from_be_bytes([*b]))
        }
        ContentType::U16 => {
            exact(2)?;
            DmapValue::U16(BigEndian::read_u16(payload))
        }
        ContentType::I16 => {
            exact(2)?;
            DmapValue::I16(BigEndian::read_i16(payload))
        }
        ContentType::U32 => {
            exact(4)?;
            DmapValue::U32(BigEndian::read_u32(payload))
        }
        ContentType::I32 => {
            exact(4)?;
            DmapValue::I32(BigEndian::read_i32(payload))
        }
        ContentType::U64 => {
            exact(8)?;
            DmapValue::U64(BigEndian::read_u64(payload))
        }
        ContentType::I64 => {
            exact(8)?;
            DmapValue::I64(BigEndian::read_i64(payload))
        }
        ContentType::Date => {
            exact(4)?;
            DmapValue::Date(BigEndian::read_u32(payload))
        }
        ContentType::Version => {
            exact(4)?;
            DmapValue::Version {
                major: BigEndian::read_u16(&payload[..2]),
                minor: payload[2],
                micro: payload[3],
            }
        }
        ContentType::Str => {
            // Exactly `length` bytes; the wire does not NUL-terminate
            let s = std::str::from_utf8(payload).map_err(|_| DmapError::InvalidString {
                code: code.to_string(),
            })?;
            DmapValue::Str(s.to_string())
        }
        ContentType::Container => {
            DmapValue::List(parse_sequence(payload, registry, depth + 1)?)
        }
        ContentType::Raw => DmapValue::Raw(payload.to_vec()),
    };

    Ok(value)
}
