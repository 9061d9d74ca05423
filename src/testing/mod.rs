//! Test support: an in-process DAAP share
//!
//! [`MockShare`] binds a real TCP listener and answers the control sequence
//! with DMAP bodies built by [`DmapWriter`](crate::protocol::dmap::DmapWriter),
//! so connection and streaming code is exercised over actual sockets rather
//! than canned byte buffers.

mod mock;

pub use mock::{MockPlaylist, MockShare, MockShareConfig, RecordedRequest};
