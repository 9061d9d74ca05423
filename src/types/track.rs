//! Track metadata decoded from a song listing

/// One track record from a GET_SONGS response.
///
/// Transient: the connection hands each record to the database sink as it is
/// decoded and keeps no copy of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackRecord {
    /// Server-assigned item id, unique within the database
    pub item_id: u32,
    /// Persistent id, stable across server restarts
    pub persistent_id: u64,
    /// Track title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Album name
    pub album: String,
    /// Genre
    pub genre: String,
    /// Track number within the album
    pub track_number: u16,
    /// Total tracks on the album, if reported
    pub track_count: u16,
    /// Release year
    pub year: u16,
    /// Duration in milliseconds
    pub duration_ms: u32,
    /// File size in bytes
    pub size_bytes: u64,
    /// Encoded bitrate in kbit/s
    pub bitrate: u16,
    /// File format extension, e.g. `mp3`
    pub format: String,
    /// Database-relative URI used to stream the track
    pub uri: String,
}

impl TrackRecord {
    /// Byte offset corresponding to a time offset, using the track bitrate.
    ///
    /// Used by the streaming source to translate a seek request into an HTTP
    /// byte range. Returns `None` when the bitrate is unknown.
    #[must_use]
    pub fn bytes_at(&self, time_offset_ms: u64) -> Option<u64> {
        if self.bitrate == 0 {
            return None;
        }
        // kbit/s * ms = bits, / 8 = bytes
        Some(u64::from(self.bitrate) * time_offset_ms / 8)
    }
}
