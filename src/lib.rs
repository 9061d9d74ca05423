//! # daap
//!
//! A pure Rust client for DAAP, the protocol iTunes uses to share music
//! libraries over the local network.
//!
//! ## Features
//!
//! - Share discovery via mDNS
//! - The full login and browse sequence, including password-protected shares
//! - Per-request validation hashing compatible with iTunes servers
//! - Incremental song-listing delivery into a pluggable database sink
//! - Track streaming with seek, over a dedicated data connection
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use daap::{DaapConfig, DaapConnection, MemorySink, NoPassword};
//!
//! # async fn example() -> Result<(), daap::DaapError> {
//! // Find shares on the network
//! let shares = daap::scan(Duration::from_secs(5)).await?;
//!
//! if let Some(share) = shares.first() {
//!     let connection = DaapConnection::new(share.clone(), DaapConfig::default());
//!     let sink = Arc::new(MemorySink::new());
//!
//!     connection.connect(sink.clone(), &NoPassword).await?;
//!
//!     for track in sink.tracks(&connection.source_uri()) {
//!         println!("{} - {}", track.artist, track.title);
//!     }
//!
//!     connection.disconnect().await;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Discovery**: `discovery` - mDNS browsing for `_daap._tcp` shares
//! - **Connection**: `DaapConnection` - the linear login/browse sequence
//! - **Streaming**: `TrackStream` - seekable track downloads
//! - **Low-level**: `protocol` - DMAP codec, validation hash, HTTP driver

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Core types
pub mod types;

/// Testing utilities
pub mod testing;

pub mod connection;
pub mod discovery;
pub mod library;
pub mod protocol;
pub mod streaming;

// Re-exports
pub use connection::{
    Authenticator, ConnectionEvent, ConnectionPhase, DaapConnection, NoPassword, StaticPassword,
};
pub use discovery::{DiscoveryEvent, discover, scan};
pub use error::{DaapError, DmapError};
pub use library::{DatabaseSink, MemorySink};
pub use streaming::TrackStream;
pub use types::{DaapConfig, DaapShare, Playlist, TrackRecord};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
