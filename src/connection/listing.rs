//! Decoders for the DMAP control responses
//!
//! Each function takes the parsed top-level items of one response and pulls
//! out what the connect sequence needs, reporting a missing mandatory chunk
//! as [`DmapError::MissingChunk`].

use crate::error::{DaapError, DmapError, Result};
use crate::protocol::dmap::{DmapItem, find_root};
use crate::types::TrackRecord;

fn missing(code: &[u8; 4]) -> DaapError {
    DaapError::Dmap(DmapError::MissingChunk {
        code: String::from_utf8_lossy(code).into_owned(),
    })
}

/// What `/server-info` tells us about the share
#[derive(Debug, Clone)]
pub(crate) struct ServerInfo {
    /// Share display name
    pub name: String,
    /// Major DAAP protocol version; selects the validation hash variant
    pub daap_major: u16,
    /// Whether login requires credentials
    pub login_required: bool,
}

pub(crate) fn decode_server_info(items: &[DmapItem]) -> Result<ServerInfo> {
    let root = find_root(items, b"msrv").ok_or_else(|| missing(b"msrv"))?;

    let daap_major = root
        .child(b"apro")
        .and_then(DmapItem::as_version)
        .map(|(major, _, _)| major)
        .ok_or_else(|| missing(b"apro"))?;

    let name = root
        .child(b"minm")
        .and_then(DmapItem::as_str)
        .unwrap_or_default()
        .to_string();

    // Either flag marks the share as protected; servers disagree on which
    let login_required = root.child(b"mslr").and_then(DmapItem::as_u8) == Some(1)
        || root.child(b"msau").and_then(DmapItem::as_u8).unwrap_or(0) >= 2;

    Ok(ServerInfo {
        name,
        daap_major,
        login_required,
    })
}

/// Session id from a `/login` response
pub(crate) fn decode_session_id(items: &[DmapItem]) -> Result<u32> {
    find_root(items, b"mlog")
        .ok_or_else(|| missing(b"mlog"))?
        .child(b"mlid")
        .and_then(DmapItem::as_u32)
        .ok_or_else(|| missing(b"mlid"))
}

/// Revision number from an `/update` response
pub(crate) fn decode_revision(items: &[DmapItem]) -> Result<u32> {
    find_root(items, b"mupd")
        .ok_or_else(|| missing(b"mupd"))?
        .child(b"musr")
        .and_then(DmapItem::as_u32)
        .ok_or_else(|| missing(b"musr"))
}

/// First database from a `/databases` response.
///
/// DAAP servers expose exactly one database per share; anything after the
/// first is ignored.
pub(crate) fn decode_first_database(items: &[DmapItem]) -> Result<u32> {
    find_root(items, b"avdb")
        .ok_or_else(|| missing(b"avdb"))?
        .child(b"mlcl")
        .ok_or_else(|| missing(b"mlcl"))?
        .child(b"mlit")
        .ok_or_else(|| missing(b"mlit"))?
        .child(b"miid")
        .and_then(DmapItem::as_u32)
        .ok_or_else(|| missing(b"miid"))
}

/// Track records from a `/databases/N/items` response, in listing order.
///
/// The `uri` field is left empty; the caller fills it in with the
/// session-qualified download location. Items without an id are skipped
/// rather than failing the whole listing.
pub(crate) fn decode_tracks(items: &[DmapItem]) -> Result<Vec<TrackRecord>> {
    let listing = find_root(items, b"adbs")
        .ok_or_else(|| missing(b"adbs"))?
        .child(b"mlcl")
        .ok_or_else(|| missing(b"mlcl"))?;

    let mut tracks = Vec::new();
    for item in listing.children_with(b"mlit") {
        let Some(item_id) = item.child(b"miid").and_then(DmapItem::as_u32) else {
            tracing::warn!("song listing item without an item id, skipping");
            continue;
        };

        let text = |code| {
            item.child(code)
                .and_then(DmapItem::as_str)
                .unwrap_or_default()
                .to_string()
        };

        tracks.push(TrackRecord {
            item_id,
            persistent_id: item.child(b"mper").and_then(DmapItem::as_u64).unwrap_or(0),
            title: text(b"minm"),
            artist: text(b"asar"),
            album: text(b"asal"),
            genre: text(b"asgn"),
            track_number: item.child(b"astn").and_then(DmapItem::as_u16).unwrap_or(0),
            track_count: item.child(b"astc").and_then(DmapItem::as_u16).unwrap_or(0),
            year: item.child(b"asyr").and_then(DmapItem::as_u16).unwrap_or(0),
            duration_ms: item.child(b"astm").and_then(DmapItem::as_u32).unwrap_or(0),
            size_bytes: item.child(b"assz").and_then(DmapItem::as_u64).unwrap_or(0),
            bitrate: item.child(b"asbr").and_then(DmapItem::as_u16).unwrap_or(0),
            format: text(b"asfm"),
            uri: String::new(),
        });
    }
    Ok(tracks)
}

/// One playlist header from a containers listing
#[derive(Debug, Clone)]
pub(crate) struct PlaylistHead {
    pub id: u32,
    pub name: String,
    /// The base playlist mirrors the whole library and is skipped
    pub is_base: bool,
}

pub(crate) fn decode_playlists(items: &[DmapItem]) -> Result<Vec<PlaylistHead>> {
    let listing = find_root(items, b"aply")
        .ok_or_else(|| missing(b"aply"))?
        .child(b"mlcl")
        .ok_or_else(|| missing(b"mlcl"))?;

    let mut heads = Vec::new();
    for item in listing.children_with(b"mlit") {
        let Some(id) = item.child(b"miid").and_then(DmapItem::as_u32) else {
            continue;
        };
        heads.push(PlaylistHead {
            id,
            name: item
                .child(b"minm")
                .and_then(DmapItem::as_str)
                .unwrap_or_default()
                .to_string(),
            is_base: item.child(b"abpl").is_some(),
        });
    }
    Ok(heads)
}

/// Member item ids from a playlist entries response, in playlist order
pub(crate) fn decode_playlist_item_ids(items: &[DmapItem]) -> Result<Vec<u32>> {
    let listing = find_root(items, b"apso")
        .ok_or_else(|| missing(b"apso"))?
        .child(b"mlcl")
        .ok_or_else(|| missing(b"mlcl"))?;

    Ok(listing
        .children_with(b"mlit")
        .filter_map(|item| item.child(b"miid").and_then(DmapItem::as_u32))
        .collect())
}
