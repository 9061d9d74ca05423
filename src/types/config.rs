//! Client configuration

use std::time::Duration;

/// Metadata fields requested with every song listing.
///
/// The server only returns fields named here, so this list bounds what a
/// [`crate::types::TrackRecord`] can carry.
pub const DEFAULT_SONG_META: &str = "dmap.itemid,dmap.itemname,dmap.itemkind,dmap.persistentid,\
                                     daap.songalbum,daap.songartist,daap.songgenre,daap.songsize,\
                                     daap.songtime,daap.songtrackcount,daap.songtracknumber,\
                                     daap.songbitrate,daap.songformat,daap.songyear";

/// Configuration for DAAP connections
#[derive(Debug, Clone)]
pub struct DaapConfig {
    /// DAAP protocol version advertised in `Client-DAAP-Version`
    pub daap_version: (u16, u16),
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Timeout for the whole login sequence
    pub connection_timeout: Duration,
    /// Timeout for a single HTTP exchange
    pub request_timeout: Duration,
    /// Comma-separated metadata fields for song listings
    pub song_meta: String,
}

impl Default for DaapConfig {
    fn default() -> Self {
        Self {
            daap_version: (3, 0),
            // iTunes rejects clients it does not recognize
            user_agent: "iTunes/4.6 (Windows; N)".to_string(),
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(15),
            song_meta: DEFAULT_SONG_META.to_string(),
        }
    }
}

impl DaapConfig {
    /// Major protocol version, used to select the validation hash variant
    #[must_use]
    pub fn version_major(&self) -> u16 {
        self.daap_version.0
    }

    /// Version string for the `Client-DAAP-Version` header, e.g. `3.0`
    #[must_use]
    pub fn version_string(&self) -> String {
        format!("{}.{}", self.daap_version.0, self.daap_version.1)
    }
}
