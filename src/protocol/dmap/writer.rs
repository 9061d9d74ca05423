//! DMAP serializer
//!
//! Used by the mock share in tests and to re-serialize parsed trees for the
//! round-trip property. Values are written with the exact wire sizes their
//! types declare, so `serialize(parse(buf)) == buf` for well-formed input.

use super::value::{DmapItem, DmapValue};

/// Incremental DMAP writer
#[derive(Debug, Default)]
pub struct DmapWriter {
    buffer: Vec<u8>,
}

impl DmapWriter {
    /// Create an empty writer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish and return the encoded bytes
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    fn chunk(&mut self, code: &[u8; 4], payload: &[u8]) {
        self.buffer.extend_from_slice(code);
        #[allow(clippy::cast_possible_truncation)]
        let len = payload.len() as u32;
        self.buffer.extend_from_slice(&len.to_be_bytes());
        self.buffer.extend_from_slice(payload);
    }

    /// Write an unsigned 8-bit chunk
    pub fn u8(&mut self, code: &[u8; 4], value: u8) {
        self.chunk(code, &[value]);
    }

    /// Write an unsigned 16-bit chunk
    pub fn u16(&mut self, code: &[u8; 4], value: u16) {
        self.chunk(code, &value.to_be_bytes());
    }

    /// Write an unsigned 32-bit chunk
    pub fn u32(&mut self, code: &[u8; 4], value: u32) {
        self.chunk(code, &value.to_be_bytes());
    }

    /// Write an unsigned 64-bit chunk
    pub fn u64(&mut self, code: &[u8; 4], value: u64) {
        self.chunk(code, &value.to_be_bytes());
    }

    /// Write a string chunk (no NUL terminator, exactly the string bytes)
    pub fn string(&mut self, code: &[u8; 4], value: &str) {
        self.chunk(code, value.as_bytes());
    }

    /// Write a version chunk: u16 major, u8 minor, u8 micro
    pub fn version(&mut self, code: &[u8; 4], major: u16, minor: u8, micro: u8) {
        let major = major.to_be_bytes();
        self.chunk(code, &[major[0], major[1], minor, micro]);
    }

    /// Write raw payload bytes under a code
    pub fn raw(&mut self, code: &[u8; 4], payload: &[u8]) {
        self.chunk(code, payload);
    }

    /// Write a container whose children are produced by `build`
    pub fn container(&mut self, code: &[u8; 4], build: impl FnOnce(&mut DmapWriter)) {
        let mut inner = DmapWriter::new();
        build(&mut inner);
        self.chunk(code, &inner.finish());
    }
}

/// Serialize a parsed tree back to wire bytes
#[must_use]
pub fn serialize(items: &[DmapItem]) -> Vec<u8> {
    let mut writer = DmapWriter::new();
    write_items(&mut writer, items);
    writer.finish()
}

fn write_items(writer: &mut DmapWriter, items: &[DmapItem]) {
    for item in items {
        let code = &item.code.0;
        match &item.value {
            DmapValue::U8(v) => writer.u8(code, *v),
            #[allow(clippy::cast_sign_loss)]
            DmapValue::I8(v) => writer.u8(code, *v as u8),
            DmapValue::U16(v) => writer.u16(code, *v),
            #[allow(clippy::cast_sign_loss)]
            DmapValue::I16(v) => writer.u16(code, *v as u16),
            DmapValue::U32(v) | DmapValue::Date(v) => writer.u32(code, *v),
            #[allow(clippy::cast_sign_loss)]
            DmapValue::I32(v) => writer.u32(code, *v as u32),
            DmapValue::U64(v) => writer.u64(code, *v),
            #[allow(clippy::cast_sign_loss)]
            DmapValue::I64(v) => writer.u64(code, *v as u64),
            DmapValue::Str(s) => writer.string(code, s),
            DmapValue::Version {
                major,
                minor,
                micro,
            } => writer.version(code, *major, *minor, *micro),
            DmapValue::List(children) => {
                writer.container(code, |inner| write_items(inner, children));
            }
            DmapValue::Raw(bytes) => writer.raw(code, bytes),
        }
    }
}
