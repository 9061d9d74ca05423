use super::*;
use crate::error::DaapError;

fn feed_all(codec: &mut HttpCodec, bytes: &[u8]) {
    codec.feed(bytes).unwrap();
}

fn drain_body(codec: &mut HttpCodec) -> Vec<u8> {
    let mut body = Vec::new();
    assert!(codec.read_body_to_end(&mut body).unwrap());
    body
}

#[test]
fn test_content_length_body() {
    let mut codec = HttpCodec::new();
    feed_all(
        &mut codec,
        b"HTTP/1.1 200 OK\r\nContent-Type: application/x-dmap-tagged\r\nContent-Length: 5\r\n\r\nhello",
    );

    let head = codec.decode_head().unwrap().unwrap();
    assert_eq!(head.status, 200);
    assert_eq!(head.reason, "OK");
    assert_eq!(
        head.headers.get("content-type"),
        Some("application/x-dmap-tagged")
    );
    assert_eq!(drain_body(&mut codec), b"hello");
}

#[test]
fn test_head_parsed_before_body_arrives() {
    let mut codec = HttpCodec::new();
    feed_all(&mut codec, b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nab");

    assert!(codec.decode_head().unwrap().is_some());
    let mut out = [0u8; 16];
    let progress = codec.read_body(&mut out).unwrap();
    assert_eq!(progress.written, 2);
    assert!(!progress.finished);

    feed_all(&mut codec, b"cd");
    let progress = codec.read_body(&mut out[2..]).unwrap();
    assert_eq!(progress.written, 2);
    assert!(progress.finished);
    assert_eq!(&out[..4], b"abcd");
}

#[test]
fn test_chunked_body_reassembly() {
    let mut codec = HttpCodec::new();
    feed_all(
        &mut codec,
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
          4\r\nWiki\r\n5\r\npedia\r\nE\r\n in\r\n\r\nchunks.\r\n0\r\n\r\n",
    );

    codec.decode_head().unwrap().unwrap();
    assert_eq!(drain_body(&mut codec), b"Wikipedia in\r\n\r\nchunks.");
}

#[test]
fn test_chunked_reassembly_is_fragmentation_independent() {
    let wire = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                 3\r\nabc\r\n8\r\ndefghijk\r\n1\r\nl\r\n0\r\n\r\n";

    // Feed one byte at a time: the reassembled stream must be identical
    let mut codec = HttpCodec::new();
    let mut body = Vec::new();
    let mut head_seen = false;
    for byte in wire {
        codec.feed(&[*byte]).unwrap();
        if !head_seen {
            head_seen = codec.decode_head().unwrap().is_some();
            if !head_seen {
                continue;
            }
        }
        let mut out = [0u8; 8];
        let progress = codec.read_body(&mut out).unwrap();
        body.extend_from_slice(&out[..progress.written]);
        if progress.finished {
            break;
        }
    }
    assert_eq!(body, b"abcdefghijkl");
}

#[test]
fn test_chunk_extensions_ignored() {
    let mut codec = HttpCodec::new();
    feed_all(
        &mut codec,
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4;ext=1\r\ndata\r\n0\r\n\r\n",
    );
    codec.decode_head().unwrap().unwrap();
    assert_eq!(drain_body(&mut codec), b"data");
}

#[test]
fn test_bad_chunk_size_is_protocol_error() {
    let mut codec = HttpCodec::new();
    feed_all(
        &mut codec,
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nxyz\r\n",
    );
    codec.decode_head().unwrap().unwrap();

    let mut out = [0u8; 8];
    let err = codec.read_body(&mut out).unwrap_err();
    assert!(matches!(err, DaapError::ProtocolError { .. }));
}

#[test]
fn test_oversized_headers_rejected() {
    let mut codec = HttpCodec::new();
    codec.feed(b"HTTP/1.1 200 OK\r\n").unwrap();

    let filler = format!("X-Padding: {}\r\n", "y".repeat(200));
    let mut result = Ok(());
    for _ in 0..40 {
        result = codec.feed(filler.as_bytes());
        if result.is_err() {
            break;
        }
    }
    assert!(matches!(result, Err(DaapError::ProtocolError { .. })));
}

#[test]
fn test_malformed_status_line() {
    let mut codec = HttpCodec::new();
    feed_all(&mut codec, b"ICY 200 OK\r\n\r\n");
    assert!(matches!(
        codec.decode_head(),
        Err(DaapError::ProtocolError { .. })
    ));
}

#[test]
fn test_eof_mid_content_length_body_is_error() {
    let mut codec = HttpCodec::new();
    feed_all(&mut codec, b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc");
    codec.decode_head().unwrap().unwrap();

    let mut out = [0u8; 16];
    assert_eq!(codec.read_body(&mut out).unwrap().written, 3);

    codec.mark_eof();
    assert!(codec.read_body(&mut out).is_err());
}

#[test]
fn test_no_content_status_has_empty_body() {
    let mut codec = HttpCodec::new();
    feed_all(&mut codec, b"HTTP/1.1 204 No Content\r\n\r\n");
    let head = codec.decode_head().unwrap().unwrap();
    assert_eq!(head.status, 204);

    let mut out = [0u8; 4];
    let progress = codec.read_body(&mut out).unwrap();
    assert_eq!(progress.written, 0);
    assert!(progress.finished);
}

#[test]
fn test_partial_range_status_is_success() {
    let mut codec = HttpCodec::new();
    feed_all(
        &mut codec,
        b"HTTP/1.1 206 Partial Content\r\nContent-Length: 2\r\n\r\nok",
    );
    let head = codec.decode_head().unwrap().unwrap();
    assert!(head.is_success());
}

#[test]
fn test_codec_reset_for_keepalive() {
    let mut codec = HttpCodec::new();
    feed_all(&mut codec, b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nab");
    codec.decode_head().unwrap().unwrap();
    assert_eq!(drain_body(&mut codec), b"ab");

    codec.reset();
    feed_all(&mut codec, b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\ncd");
    codec.decode_head().unwrap().unwrap();
    assert_eq!(drain_body(&mut codec), b"cd");
}
