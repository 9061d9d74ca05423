//! Sans-IO HTTP response parser
//!
//! Incremental: feed socket bytes with [`HttpCodec::feed`], pull the parsed
//! status line and headers with [`HttpCodec::decode_head`], then drain body
//! bytes with [`HttpCodec::read_body`]. Reassembly is independent of how the
//! socket fragments the stream, and both `Content-Length`-delimited and
//! chunked bodies come out as one contiguous byte sequence.

use bytes::{Buf, BytesMut};

use crate::error::{DaapError, Result};

/// Response headers exceeding this many bytes are a protocol error
const MAX_HEADER_BYTES: usize = 4096;

/// Case-insensitive response header map
#[derive(Debug, Clone, Default)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Look up a header by case-insensitive name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parsed `Content-Length`, if present
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.get("Content-Length").and_then(|v| v.trim().parse().ok())
    }

    /// Whether the body uses chunked transfer encoding
    #[must_use]
    pub fn is_chunked(&self) -> bool {
        self.get("Transfer-Encoding")
            .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    }
}

/// Parsed status line and headers
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    pub reason: String,
    /// Response headers
    pub headers: Headers,
}

impl ResponseHead {
    /// Whether the status is 200 or 206
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200 || self.status == 206
    }
}

/// Progress of one [`HttpCodec::read_body`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyProgress {
    /// Bytes written into the caller's buffer
    pub written: usize,
    /// Whether the body has ended
    pub finished: bool,
}

#[derive(Debug)]
enum ParseState {
    StatusLine,
    HeaderLines { status: u16, reason: String },
    Body(BodyFraming),
    Finished,
}

#[derive(Debug)]
enum BodyFraming {
    /// Delimited by Content-Length
    Length { remaining: u64 },
    /// Chunked transfer encoding
    Chunked(ChunkPhase),
    /// Neither framing header present: body runs until the peer closes
    UntilClose,
}

#[derive(Debug)]
enum ChunkPhase {
    /// Expecting a hex size line
    Size,
    /// Copying chunk payload
    Data { remaining: u64 },
    /// Expecting the CRLF after a chunk payload
    DataCrlf,
    /// Consuming trailer lines after the zero-size chunk
    Trailer,
}

/// Incremental HTTP/1.1 response parser
#[derive(Debug)]
pub struct HttpCodec {
    buffer: BytesMut,
    state: ParseState,
    header_lines: Vec<(String, String)>,
    eof: bool,
}

impl Default for HttpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpCodec {
    /// Create a codec ready for a status line
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            state: ParseState::StatusLine,
            header_lines: Vec::new(),
            eof: false,
        }
    }

    /// Feed bytes read from the socket
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the response head exceeds 4 KiB before
    /// its terminating blank line.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        if matches!(
            self.state,
            ParseState::StatusLine | ParseState::HeaderLines { .. }
        ) && self.buffer.len() > MAX_HEADER_BYTES
        {
            return Err(DaapError::ProtocolError {
                message: format!("response headers exceed {MAX_HEADER_BYTES} bytes"),
            });
        }
        Ok(())
    }

    /// Signal that the peer closed the connection.
    ///
    /// Ends an `UntilClose` body; for any other framing a later read will
    /// report the truncation.
    pub fn mark_eof(&mut self) {
        self.eof = true;
    }

    /// Try to decode the status line and headers
    ///
    /// Returns `Ok(None)` until the blank line has arrived.
    ///
    /// # Errors
    ///
    /// Returns a protocol error on a malformed status line or header.
    pub fn decode_head(&mut self) -> Result<Option<ResponseHead>> {
        loop {
            match &self.state {
                ParseState::StatusLine => {
                    let Some(line) = self.take_line() else {
                        return Ok(None);
                    };
                    let (status, reason) = parse_status_line(&line)?;
                    self.state = ParseState::HeaderLines { status, reason };
                }
                ParseState::HeaderLines { status, reason } => {
                    let (status, reason) = (*status, reason.clone());
                    let Some(line) = self.take_line() else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        let headers = Headers(std::mem::take(&mut self.header_lines));
                        let head = ResponseHead {
                            status,
                            reason,
                            headers,
                        };
                        self.state = ParseState::Body(framing_for(&head));
                        return Ok(Some(head));
                    }
                    let Some((name, value)) = line.split_once(':') else {
                        return Err(DaapError::ProtocolError {
                            message: format!("malformed header line: {line:?}"),
                        });
                    };
                    self.header_lines
                        .push((name.trim().to_string(), value.trim().to_string()));
                }
                ParseState::Body(_) | ParseState::Finished => {
                    return Err(DaapError::ProtocolError {
                        message: "head already decoded".to_string(),
                    });
                }
            }
        }
    }

    /// Drain decoded body bytes into `out`.
    ///
    /// Call after [`decode_head`](Self::decode_head) has returned a head.
    /// `written == 0 && !finished` means more socket bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns a protocol error on chunked-encoding syntax violations or a
    /// network error if the peer closed mid-body.
    pub fn read_body(&mut self, out: &mut [u8]) -> Result<BodyProgress> {
        let ParseState::Body(framing) = &mut self.state else {
            return Ok(BodyProgress {
                written: 0,
                finished: matches!(self.state, ParseState::Finished),
            });
        };

        match framing {
            BodyFraming::Length { remaining } => {
                if *remaining == 0 {
                    self.state = ParseState::Finished;
                    return Ok(BodyProgress {
                        written: 0,
                        finished: true,
                    });
                }
                let take = usize::try_from(*remaining)
                    .unwrap_or(usize::MAX)
                    .min(out.len())
                    .min(self.buffer.len());
                if take == 0 {
                    if self.eof {
                        return Err(DaapError::ProtocolError {
                            message: format!("connection closed with {remaining} body bytes left"),
                        });
                    }
                    return Ok(BodyProgress {
                        written: 0,
                        finished: false,
                    });
                }
                out[..take].copy_from_slice(&self.buffer[..take]);
                self.buffer.advance(take);
                *remaining -= take as u64;
                let finished = *remaining == 0;
                if finished {
                    self.state = ParseState::Finished;
                }
                Ok(BodyProgress {
                    written: take,
                    finished,
                })
            }
            BodyFraming::Chunked(_) => self.read_chunked(out),
            BodyFraming::UntilClose => {
                let take = out.len().min(self.buffer.len());
                out[..take].copy_from_slice(&self.buffer[..take]);
                self.buffer.advance(take);
                let finished = self.buffer.is_empty() && self.eof;
                if finished {
                    self.state = ParseState::Finished;
                }
                Ok(BodyProgress {
                    written: take,
                    finished,
                })
            }
        }
    }

    /// Read the entire remaining body into a vector.
    ///
    /// Used by the control plane, whose DMAP responses are bounded. Returns
    /// `Ok(None)` when more socket bytes are needed.
    ///
    /// # Errors
    ///
    /// Propagates [`read_body`](Self::read_body) errors.
    pub fn read_body_to_end(&mut self, acc: &mut Vec<u8>) -> Result<bool> {
        let mut scratch = [0u8; 4096];
        loop {
            let progress = self.read_body(&mut scratch)?;
            acc.extend_from_slice(&scratch[..progress.written]);
            if progress.finished {
                return Ok(true);
            }
            if progress.written == 0 {
                return Ok(false);
            }
        }
    }

    /// Reset for the next response.
    ///
    /// Discards any unread bytes, so a body abandoned mid-read does not
    /// bleed into the next response.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = ParseState::StatusLine;
        self.header_lines.clear();
        self.eof = false;
    }

    fn read_chunked(&mut self, out: &mut [u8]) -> Result<BodyProgress> {
        let mut written = 0;

        loop {
            let ParseState::Body(BodyFraming::Chunked(phase)) = &mut self.state else {
                return Ok(BodyProgress {
                    written,
                    finished: true,
                });
            };

            match phase {
                ChunkPhase::Size => {
                    let Some(line) = self.take_line() else {
                        return self.chunked_stall(written);
                    };
                    // Chunk extensions after ';' are permitted and ignored
                    let size_text = line.split(';').next().unwrap_or("").trim();
                    let size =
                        u64::from_str_radix(size_text, 16).map_err(|_| DaapError::ProtocolError {
                            message: format!("invalid chunk size line: {line:?}"),
                        })?;
                    let ParseState::Body(BodyFraming::Chunked(phase)) = &mut self.state else {
                        unreachable!()
                    };
                    *phase = if size == 0 {
                        ChunkPhase::Trailer
                    } else {
                        ChunkPhase::Data { remaining: size }
                    };
                }
                ChunkPhase::Data { remaining } => {
                    let take = usize::try_from(*remaining)
                        .unwrap_or(usize::MAX)
                        .min(out.len() - written)
                        .min(self.buffer.len());
                    if take == 0 {
                        if written < out.len() {
                            return self.chunked_stall(written);
                        }
                        return Ok(BodyProgress {
                            written,
                            finished: false,
                        });
                    }
                    out[written..written + take].copy_from_slice(&self.buffer[..take]);
                    self.buffer.advance(take);
                    written += take;
                    *remaining -= take as u64;
                    if *remaining == 0 {
                        *phase = ChunkPhase::DataCrlf;
                    }
                }
                ChunkPhase::DataCrlf => {
                    if self.buffer.len() < 2 {
                        return self.chunked_stall(written);
                    }
                    if &self.buffer[..2] != b"\r\n" {
                        return Err(DaapError::ProtocolError {
                            message: "missing CRLF after chunk data".to_string(),
                        });
                    }
                    self.buffer.advance(2);
                    *phase = ChunkPhase::Size;
                }
                ChunkPhase::Trailer => {
                    let Some(line) = self.take_line() else {
                        return self.chunked_stall(written);
                    };
                    if line.is_empty() {
                        self.state = ParseState::Finished;
                        return Ok(BodyProgress {
                            written,
                            finished: true,
                        });
                    }
                    // Trailer headers are consumed and discarded
                }
            }
        }
    }

    fn chunked_stall(&self, written: usize) -> Result<BodyProgress> {
        if self.eof {
            return Err(DaapError::ProtocolError {
                message: "connection closed mid-chunk".to_string(),
            });
        }
        Ok(BodyProgress {
            written,
            finished: false,
        })
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.buffer.windows(2).position(|w| w == b"\r\n")?;
        let line = String::from_utf8_lossy(&self.buffer[..end]).into_owned();
        self.buffer.advance(end + 2);
        Some(line)
    }
}

fn framing_for(head: &ResponseHead) -> BodyFraming {
    if head.headers.is_chunked() {
        BodyFraming::Chunked(ChunkPhase::Size)
    } else if let Some(length) = head.headers.content_length() {
        BodyFraming::Length { remaining: length }
    } else if head.status == 204 {
        BodyFraming::Length { remaining: 0 }
    } else {
        BodyFraming::UntilClose
    }
}

fn parse_status_line(line: &str) -> Result<(u16, String)> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/1.") {
        return Err(DaapError::ProtocolError {
            message: format!("invalid status line: {line:?}"),
        });
    }
    let status = parts
        .next()
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| DaapError::ProtocolError {
            message: format!("invalid status code in: {line:?}"),
        })?;
    let reason = parts.next().unwrap_or("").to_string();
    Ok((status, reason))
}
