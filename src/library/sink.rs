//! Sink trait the connection streams library data into

use async_trait::async_trait;

use crate::error::Result;
use crate::types::TrackRecord;

/// Receives library data as the connection decodes it.
///
/// Tracks arrive one at a time, in server listing order, tagged with the
/// source URI of the share they came from. Nothing handed to the sink before
/// [`commit`](DatabaseSink::commit) should be treated as durable: a
/// connection that fails mid-listing never commits, and the partial entries
/// are discarded with [`rollback`](DatabaseSink::rollback).
#[async_trait]
pub trait DatabaseSink: Send + Sync {
    /// Announce a source before any of its tracks arrive.
    ///
    /// Called once per connection attempt, before the song listing is
    /// requested. A source URI is the share's `daap://host:port` base.
    ///
    /// # Errors
    ///
    /// Implementations may fail on storage errors; the connection aborts.
    async fn register_source(&self, source_uri: &str) -> Result<()>;

    /// Stage one decoded track for the source.
    ///
    /// A repeated item id within one connection replaces the earlier record.
    ///
    /// # Errors
    ///
    /// Implementations may fail on storage errors; the connection aborts.
    async fn insert_or_update_track(&self, source_uri: &str, track: TrackRecord) -> Result<()>;

    /// Make everything staged for the source visible.
    ///
    /// Called once the full song listing has decoded successfully.
    ///
    /// # Errors
    ///
    /// Implementations may fail on storage errors; the connection aborts.
    async fn commit(&self, source_uri: &str) -> Result<()>;

    /// Discard staged entries for the source that were never committed.
    ///
    /// Called when a connection fails after registering the source.
    ///
    /// # Errors
    ///
    /// Implementations may fail on storage errors.
    async fn rollback(&self, source_uri: &str) -> Result<()>;

    /// Remove all entries, staged and committed, for the source.
    ///
    /// Called on disconnect so stale tracks never outlive their share.
    ///
    /// # Errors
    ///
    /// Implementations may fail on storage errors.
    async fn delete_all_for_source(&self, source_uri: &str) -> Result<()>;
}
