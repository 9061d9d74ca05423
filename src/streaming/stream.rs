//! Streaming reads of one track

use std::sync::{Arc, Weak};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::connection::DaapConnection;
use crate::error::{DaapError, Result};
use crate::protocol::http::HttpCodec;
use crate::types::TrackRecord;

/// A readable byte stream over one track on a connected share.
///
/// The stream uses its own HTTP connection so a long download never blocks
/// the control plane. Seeking reconnects with a `Range` header; the server
/// does the positioning. A stream holds only a weak reference to its
/// connection: once the connection is dropped, further operations fail with
/// [`DaapError::ConnectionGone`].
#[derive(Debug)]
pub struct TrackStream {
    connection: Weak<DaapConnection>,
    track: TrackRecord,
    path: String,
    stream: Option<TcpStream>,
    codec: HttpCodec,
    position: u64,
    length: Option<u64>,
    /// Body bytes still to drop after a seek the server answered with a
    /// full-body 200 instead of 206
    discard: u64,
}

impl TrackStream {
    /// Open `track` for reading from the start.
    ///
    /// # Errors
    ///
    /// Fails if the connection is not established, the track URI is not one
    /// this share produced, or the download request is refused.
    pub async fn open(connection: &Arc<DaapConnection>, track: &TrackRecord) -> Result<Self> {
        let path = server_path(&track.uri)?;
        let mut stream = Self {
            connection: Arc::downgrade(connection),
            track: track.clone(),
            path,
            stream: None,
            codec: HttpCodec::new(),
            position: 0,
            length: None,
            discard: 0,
        };
        stream.reconnect(0).await?;
        Ok(stream)
    }

    /// The track this stream reads
    #[must_use]
    pub fn track(&self) -> &TrackRecord {
        &self.track
    }

    /// Current byte position
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total track length in bytes, when the server reported one
    #[must_use]
    pub fn len_bytes(&self) -> Option<u64> {
        self.length
    }

    /// Read up to `buf.len()` bytes. `Ok(0)` means end of stream.
    ///
    /// Chunked and content-length framed responses read identically; the
    /// framing never shows through.
    ///
    /// # Errors
    ///
    /// Socket errors and framing violations fail the read; the stream is not
    /// usable afterwards except via [`seek_to`](Self::seek_to).
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            if self.discard > 0 {
                let mut scratch = [0u8; 8192];
                let want = scratch
                    .len()
                    .min(usize::try_from(self.discard).unwrap_or(usize::MAX));
                let progress = self.codec.read_body(&mut scratch[..want])?;
                self.discard -= progress.written as u64;
                if progress.finished && self.discard > 0 {
                    return Err(DaapError::ProtocolError {
                        message: "track body ended before the seek offset".to_string(),
                    });
                }
                if progress.written > 0 {
                    continue;
                }
            } else {
                let progress = self.codec.read_body(buf)?;
                if progress.written > 0 {
                    self.position += progress.written as u64;
                    return Ok(progress.written);
                }
                if progress.finished {
                    return Ok(0);
                }
            }

            let Some(stream) = self.stream.as_mut() else {
                return Err(DaapError::InvalidState {
                    message: "read on a closed track stream".to_string(),
                    current_state: "closed".to_string(),
                });
            };
            let mut chunk = [0u8; 8192];
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                self.codec.mark_eof();
            } else {
                self.codec.feed(&chunk[..n])?;
            }
        }
    }

    /// Reposition to an absolute byte offset by reconnecting with a range
    /// request.
    ///
    /// # Errors
    ///
    /// Fails if the originating connection is gone or the server refuses the
    /// range.
    pub async fn seek_to(&mut self, byte_offset: u64) -> Result<()> {
        self.reconnect(byte_offset).await
    }

    /// Reposition to a time offset using the track bitrate.
    ///
    /// # Errors
    ///
    /// Fails when the track has no known bitrate, and on the same conditions
    /// as [`seek_to`](Self::seek_to).
    pub async fn seek_to_time(&mut self, time_offset_ms: u64) -> Result<()> {
        let offset = self
            .track
            .bytes_at(time_offset_ms)
            .ok_or_else(|| DaapError::InvalidState {
                message: "track bitrate unknown, cannot seek by time".to_string(),
                current_state: "open".to_string(),
            })?;
        self.seek_to(offset).await
    }

    /// Drop the data connection. The control connection is unaffected.
    pub fn close(&mut self) {
        self.stream = None;
        self.codec.reset();
        self.discard = 0;
    }

    async fn reconnect(&mut self, offset: u64) -> Result<()> {
        let connection = self.connection.upgrade().ok_or(DaapError::ConnectionGone)?;
        if !connection.is_connected() {
            return Err(DaapError::InvalidState {
                message: "track streaming requires an established connection".to_string(),
                current_state: connection.phase().as_str().to_string(),
            });
        }

        let mut request = connection.build_request(&self.path);
        if offset > 0 {
            request = request.range_from(offset);
        }
        tracing::debug!(path = %self.path, offset, "opening track stream");

        let timeout = connection.config().request_timeout;
        let host_port = connection.share().host_port();
        let mut stream = tokio::time::timeout(timeout, TcpStream::connect(&host_port))
            .await
            .map_err(|_| DaapError::ConnectionTimeout { duration: timeout })??;

        stream.write_all(&request.encode()).await?;
        stream.flush().await?;

        self.codec.reset();
        let head = loop {
            if let Some(head) = self.codec.decode_head()? {
                break head;
            }
            let mut chunk = [0u8; 4096];
            let n = tokio::time::timeout(timeout, stream.read(&mut chunk))
                .await
                .map_err(|_| DaapError::ConnectionTimeout { duration: timeout })??;
            if n == 0 {
                return Err(DaapError::Disconnected {
                    share_name: connection.share().name.clone(),
                });
            }
            self.codec.feed(&chunk[..n])?;
        };

        if !head.is_success() {
            return Err(DaapError::HttpStatus {
                status: head.status,
                reason: head.reason,
            });
        }

        // A 200 after a range request means the server ignored the Range
        // header and is sending the whole track; drop the leading bytes so
        // reads still start at the requested offset.
        let full_body = head.status == 200;
        self.discard = if full_body { offset } else { 0 };
        self.length = head.headers.content_length().map(|len| {
            if full_body { len } else { offset + len }
        });
        self.position = offset;
        self.stream = Some(stream);
        Ok(())
    }
}

/// Extract the server path (with query) from a `daap://host:port/...` track
/// URI
fn server_path(uri: &str) -> Result<String> {
    uri.find("/databases")
        .map(|start| uri[start..].to_string())
        .ok_or_else(|| DaapError::ProtocolError {
            message: format!("track uri without a database path: {uri}"),
        })
}
