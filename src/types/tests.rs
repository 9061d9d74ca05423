use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use super::*;

fn share() -> DaapShare {
    DaapShare {
        service_name: "Music._daap._tcp.local.".to_string(),
        name: "Music".to_string(),
        address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        port: 3689,
        password_protected: false,
        txt_records: HashMap::new(),
    }
}

#[test]
fn test_share_host_port() {
    assert_eq!(share().host_port(), "10.0.0.2:3689");
    assert_eq!(share().base_uri(), "daap://10.0.0.2:3689");
}

#[test]
fn test_track_seek_translation() {
    let track = TrackRecord {
        bitrate: 128,
        ..TrackRecord::default()
    };
    // 128 kbit/s for 10 seconds = 160_000 bytes
    assert_eq!(track.bytes_at(10_000), Some(160_000));

    let unknown = TrackRecord::default();
    assert_eq!(unknown.bytes_at(10_000), None);
}

#[test]
fn test_config_version_string() {
    let config = DaapConfig::default();
    assert_eq!(config.version_string(), "3.0");
    assert_eq!(config.version_major(), 3);
}

#[test]
fn test_playlist_accessors() {
    let mut pl = Playlist::new(7, "Road Trip");
    assert!(pl.is_empty());
    pl.uris.push("daap://10.0.0.2:3689/databases/1/items/4.mp3".to_string());
    assert_eq!(pl.len(), 1);
}
