use std::collections::HashMap;
use std::sync::Arc;

use super::*;
use crate::connection::{DaapConnection, NoPassword};
use crate::error::DaapError;
use crate::library::MemorySink;
use crate::testing::{MockShare, MockShareConfig};
use crate::types::{DaapConfig, TrackRecord};

#[allow(clippy::cast_possible_truncation)]
fn audio_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn streaming_config(data: &[u8]) -> MockShareConfig {
    MockShareConfig {
        name: "Streaming Library".to_string(),
        tracks: vec![TrackRecord {
            item_id: 5,
            title: "Streamed".to_string(),
            format: "mp3".to_string(),
            // 8 kbit/s makes one second of audio exactly 1000 bytes
            bitrate: 8,
            size_bytes: data.len() as u64,
            duration_ms: 240_000,
            ..TrackRecord::default()
        }],
        track_data: HashMap::from([(5, data.to_vec())]),
        ..MockShareConfig::default()
    }
}

async fn connected(
    config: MockShareConfig,
) -> (MockShare, Arc<DaapConnection>, Arc<MemorySink>) {
    let mock = MockShare::start(config).await.unwrap();
    let connection = DaapConnection::new(mock.share(), DaapConfig::default());
    let sink = Arc::new(MemorySink::new());
    connection.connect(sink.clone(), &NoPassword).await.unwrap();
    (mock, connection, sink)
}

async fn read_to_end(stream: &mut TrackStream) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    out
}

#[tokio::test]
async fn test_stream_whole_track() {
    let data = audio_bytes(5000);
    let (_mock, connection, sink) = connected(streaming_config(&data)).await;
    let track = sink.track(&connection.source_uri(), 5).unwrap();

    let mut stream = TrackStream::open(&connection, &track).await.unwrap();
    assert_eq!(stream.len_bytes(), Some(5000));

    let body = read_to_end(&mut stream).await;
    assert_eq!(body, data);
    assert_eq!(stream.position(), 5000);

    // End of stream is sticky
    let mut buf = [0u8; 16];
    assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
}

#[tokio::test]
async fn test_seek_reconnects_with_range() {
    let data = audio_bytes(5000);
    let (mock, connection, sink) = connected(streaming_config(&data)).await;
    let track = sink.track(&connection.source_uri(), 5).unwrap();

    let mut stream = TrackStream::open(&connection, &track).await.unwrap();
    stream.seek_to(4000).await.unwrap();
    assert_eq!(stream.position(), 4000);
    assert_eq!(stream.len_bytes(), Some(5000));

    let body = read_to_end(&mut stream).await;
    assert_eq!(body, data[4000..]);

    let downloads = mock.requests_for("/databases/1/items/5.mp3");
    assert_eq!(downloads.len(), 2);
    assert_eq!(downloads[0].header("Range"), None);
    assert_eq!(downloads[1].header("Range"), Some("bytes=4000-"));
}

#[tokio::test]
async fn test_seek_on_range_ignoring_server_discards_prefix() {
    let data = audio_bytes(5000);
    let mut config = streaming_config(&data);
    config.ignore_range = true;
    let (mock, connection, sink) = connected(config).await;
    let track = sink.track(&connection.source_uri(), 5).unwrap();

    let mut stream = TrackStream::open(&connection, &track).await.unwrap();
    stream.seek_to(4000).await.unwrap();
    assert_eq!(stream.position(), 4000);
    assert_eq!(stream.len_bytes(), Some(5000));

    // Server sent the whole body with a 200; reads still start at the offset
    let body = read_to_end(&mut stream).await;
    assert_eq!(body, data[4000..]);
    assert_eq!(stream.position(), 5000);

    let downloads = mock.requests_for("/databases/1/items/5.mp3");
    assert_eq!(downloads[1].header("Range"), Some("bytes=4000-"));
}

#[tokio::test]
async fn test_seek_to_time_uses_bitrate() {
    let data = audio_bytes(5000);
    let (mock, connection, sink) = connected(streaming_config(&data)).await;
    let track = sink.track(&connection.source_uri(), 5).unwrap();

    let mut stream = TrackStream::open(&connection, &track).await.unwrap();
    // 8 kbit/s, 2 seconds in = byte 2000
    stream.seek_to_time(2000).await.unwrap();

    let body = read_to_end(&mut stream).await;
    assert_eq!(body, data[2000..]);

    let downloads = mock.requests_for("/databases/1/items/5.mp3");
    assert_eq!(downloads[1].header("Range"), Some("bytes=2000-"));
}

#[tokio::test]
async fn test_seek_to_time_without_bitrate_fails() {
    let data = audio_bytes(100);
    let mut config = streaming_config(&data);
    config.tracks[0].bitrate = 0;
    let (_mock, connection, sink) = connected(config).await;
    let track = sink.track(&connection.source_uri(), 5).unwrap();

    let mut stream = TrackStream::open(&connection, &track).await.unwrap();
    assert!(stream.seek_to_time(1000).await.is_err());
}

#[tokio::test]
async fn test_seek_past_end_is_http_error() {
    let data = audio_bytes(100);
    let (_mock, connection, sink) = connected(streaming_config(&data)).await;
    let track = sink.track(&connection.source_uri(), 5).unwrap();

    let mut stream = TrackStream::open(&connection, &track).await.unwrap();
    let err = stream.seek_to(500).await.unwrap_err();
    assert!(matches!(err, DaapError::HttpStatus { status: 416, .. }));
}

#[tokio::test]
async fn test_streams_carry_validation_headers() {
    let data = audio_bytes(100);
    let (mock, connection, sink) = connected(streaming_config(&data)).await;
    let track = sink.track(&connection.source_uri(), 5).unwrap();

    let _stream = TrackStream::open(&connection, &track).await.unwrap();

    let downloads = mock.requests_for("/databases/1/items/5.mp3");
    assert!(downloads[0].header("Client-DAAP-Validation").is_some());
    assert!(downloads[0].path.contains("session-id=42"));
}

#[tokio::test]
async fn test_gone_connection_fails_seek() {
    let data = audio_bytes(100);
    let (_mock, connection, sink) = connected(streaming_config(&data)).await;
    let track = sink.track(&connection.source_uri(), 5).unwrap();

    let mut stream = TrackStream::open(&connection, &track).await.unwrap();
    drop(connection);

    let err = stream.seek_to(10).await.unwrap_err();
    assert!(matches!(err, DaapError::ConnectionGone));
}

#[tokio::test]
async fn test_stream_requires_established_connection() {
    let data = audio_bytes(100);
    let mock = MockShare::start(streaming_config(&data)).await.unwrap();
    let connection = DaapConnection::new(mock.share(), DaapConfig::default());
    let track = TrackRecord {
        uri: "daap://127.0.0.1:3689/databases/1/items/5.mp3?session-id=1".to_string(),
        ..TrackRecord::default()
    };

    let err = TrackStream::open(&connection, &track).await.unwrap_err();
    assert!(matches!(err, DaapError::InvalidState { .. }));
}
