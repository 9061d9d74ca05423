//! Track streaming
//!
//! Tracks download over their own HTTP connection, separate from the control
//! plane, and seek by reconnecting with a byte range.

mod stream;

#[cfg(test)]
mod tests;

pub use stream::TrackStream;
