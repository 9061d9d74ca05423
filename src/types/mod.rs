//! Core types for DAAP shares, tracks and playlists

mod config;
mod playlist;
mod share;
mod track;

#[cfg(test)]
mod tests;

pub use config::DaapConfig;
pub use playlist::Playlist;
pub use share::DaapShare;
pub use track::TrackRecord;
