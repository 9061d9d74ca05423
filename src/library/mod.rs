//! Database sink boundary
//!
//! The connection decodes song listings incrementally and pushes each record
//! into a [`DatabaseSink`] without accumulating the whole library in memory.
//! [`MemorySink`] is the bundled implementation, suitable for tests and for
//! callers that just want the track list.

mod memory;
mod sink;

#[cfg(test)]
mod tests;

pub use memory::MemorySink;
pub use sink::DatabaseSink;
