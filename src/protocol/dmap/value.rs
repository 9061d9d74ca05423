//! Parsed content-node tree

use super::codes::ContentCode;

/// Payload of one parsed chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmapValue {
    /// Unsigned 8-bit integer
    U8(u8),
    /// Signed 8-bit integer
    I8(i8),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Signed 16-bit integer
    I16(i16),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Signed 32-bit integer
    I32(i32),
    /// Unsigned 64-bit integer
    U64(u64),
    /// Signed 64-bit integer
    I64(i64),
    /// UTF-8 string
    Str(String),
    /// Seconds since the epoch
    Date(u32),
    /// Protocol version
    Version {
        /// Major version
        major: u16,
        /// Minor version
        minor: u8,
        /// Micro version
        micro: u8,
    },
    /// Nested chunks
    List(Vec<DmapItem>),
    /// Uninterpreted payload bytes
    Raw(Vec<u8>),
}

/// One node of the parsed tree: a content code and its typed payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmapItem {
    /// The 4-character content code
    pub code: ContentCode,
    /// The decoded payload
    pub value: DmapValue,
}

impl DmapItem {
    /// Child nodes, or an empty slice for non-container values
    #[must_use]
    pub fn children(&self) -> &[DmapItem] {
        match &self.value {
            DmapValue::List(items) => items,
            _ => &[],
        }
    }

    /// First direct child with the given code
    #[must_use]
    pub fn child(&self, code: &[u8; 4]) -> Option<&DmapItem> {
        let code = ContentCode::new(code);
        self.children().iter().find(|item| item.code == code)
    }

    /// All direct children with the given code
    pub fn children_with(&self, code: &[u8; 4]) -> impl Iterator<Item = &DmapItem> {
        let code = ContentCode::new(code);
        self.children().iter().filter(move |item| item.code == code)
    }

    /// Integer payload widened to `u64`, regardless of wire size
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self.value {
            DmapValue::U8(v) => Some(u64::from(v)),
            DmapValue::U16(v) => Some(u64::from(v)),
            DmapValue::U32(v) | DmapValue::Date(v) => Some(u64::from(v)),
            DmapValue::U64(v) => Some(v),
            DmapValue::I8(v) => u64::try_from(v).ok(),
            DmapValue::I16(v) => u64::try_from(v).ok(),
            DmapValue::I32(v) => u64::try_from(v).ok(),
            DmapValue::I64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Integer payload narrowed to `u32`
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    /// Integer payload narrowed to `u16`
    #[must_use]
    pub fn as_u16(&self) -> Option<u16> {
        self.as_u64().and_then(|v| u16::try_from(v).ok())
    }

    /// Integer payload narrowed to `u8`
    #[must_use]
    pub fn as_u8(&self) -> Option<u8> {
        self.as_u64().and_then(|v| u8::try_from(v).ok())
    }

    /// String payload
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            DmapValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Version payload as `(major, minor, micro)`
    #[must_use]
    pub fn as_version(&self) -> Option<(u16, u8, u8)> {
        match self.value {
            DmapValue::Version {
                major,
                minor,
                micro,
            } => Some((major, minor, micro)),
            _ => None,
        }
    }
}

/// Find the first top-level item with the given code.
///
/// DAAP control responses carry a single top-level container, so this is the
/// usual entry point into a parsed response.
#[must_use]
pub fn find_root<'a>(items: &'a [DmapItem], code: &[u8; 4]) -> Option<&'a DmapItem> {
    let code = ContentCode::new(code);
    items.iter().find(|item| item.code == code)
}
