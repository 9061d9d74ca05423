//! DMAP (Digital Media Access Protocol) tagged binary format
//!
//! Every DAAP control response is a tree of chunks: an 8-byte header of
//! 4-character ASCII code plus big-endian payload length, then the payload,
//! nested recursively for container codes. Bit-exact compatibility with this
//! layout is what lets us talk to real iTunes servers.

mod codes;
mod parser;
mod value;
mod writer;

#[cfg(test)]
mod tests;

pub use codes::{ContentCode, ContentCodeRegistry, ContentType};
pub use parser::parse;
pub use value::{DmapItem, DmapValue, find_root};
pub use writer::{DmapWriter, serialize};
