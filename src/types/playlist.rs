//! Playlists materialized from container listings

/// A playlist on the remote share.
///
/// Owned by the connection that fetched it and dropped with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    /// Server-assigned container id
    pub id: u32,
    /// Playlist name
    pub name: String,
    /// Track URIs in playlist order
    pub uris: Vec<String>,
}

impl Playlist {
    /// Create an empty playlist
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            uris: Vec::new(),
        }
    }

    /// Number of tracks in the playlist
    #[must_use]
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    /// Whether the playlist has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}
