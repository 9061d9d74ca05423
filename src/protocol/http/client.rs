//! HTTP exchange driver for the control plane

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::codec::{HttpCodec, ResponseHead};
use super::request::HttpRequest;
use crate::error::{DaapError, Result};

/// A complete control-plane response
#[derive(Debug)]
pub struct HttpResponse {
    /// Status line and headers
    pub head: ResponseHead,
    /// Fully-read body bytes
    pub body: Vec<u8>,
}

/// Persistent HTTP connection to one share.
///
/// Control requests reuse a single kept-alive connection; the codec resets
/// after each response. Track downloads use their own connection (see
/// `streaming`), so a long read never blocks the session.
#[derive(Debug)]
pub struct HttpClient {
    share_name: String,
    host_port: String,
    stream: Option<TcpStream>,
    codec: HttpCodec,
}

impl HttpClient {
    /// Create a client for `host_port` (`host:port`)
    #[must_use]
    pub fn new(share_name: impl Into<String>, host_port: impl Into<String>) -> Self {
        Self {
            share_name: share_name.into(),
            host_port: host_port.into(),
            stream: None,
            codec: HttpCodec::new(),
        }
    }

    /// The `host:port` this client connects to
    #[must_use]
    pub fn host_port(&self) -> &str {
        &self.host_port
    }

    /// Drop the current connection, forcing a reconnect on the next exchange.
    ///
    /// Used by disconnect to abort an in-flight blocking read.
    pub fn close(&mut self) {
        self.stream = None;
        self.codec.reset();
    }

    /// Open a fresh TCP connection to the share.
    ///
    /// # Errors
    ///
    /// Returns [`DaapError::ConnectionFailed`] if the connect fails.
    pub async fn open_stream(&self) -> Result<TcpStream> {
        tracing::debug!(host = %self.host_port, "opening connection");
        TcpStream::connect(&self.host_port)
            .await
            .map_err(|e| DaapError::ConnectionFailed {
                share_name: self.share_name.clone(),
                message: e.to_string(),
                source: Some(Box::new(e)),
            })
    }

    /// Perform one request/response exchange.
    ///
    /// Returns the response for 200/206 statuses; any other status is a
    /// [`DaapError::HttpStatus`] carrying code and reason phrase.
    ///
    /// # Errors
    ///
    /// Connect failures, socket errors, malformed responses and non-success
    /// statuses are all surfaced as distinct error variants; nothing is
    /// retried or swallowed here.
    pub async fn exchange(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        let encoded = request.encode();
        tracing::debug!(method = request.method.as_str(), path = %request.path, "request");

        self.codec.reset();
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.open_stream().await?,
        };

        stream.write_all(&encoded).await?;
        stream.flush().await?;

        let mut head: Option<ResponseHead> = None;
        let mut body = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            if head.is_none() {
                head = self.codec.decode_head()?;
            }
            if head.is_some() && self.codec.read_body_to_end(&mut body)? {
                break;
            }

            let n = stream.read(&mut buf).await?;
            if n == 0 {
                self.codec.mark_eof();
                if head.is_none() {
                    return Err(DaapError::Disconnected {
                        share_name: self.share_name.clone(),
                    });
                }
            } else {
                self.codec.feed(&buf[..n])?;
            }
        }

        // Keep the connection for the next control request
        self.stream = Some(stream);

        let Some(head) = head else {
            return Err(DaapError::ProtocolError {
                message: "response ended before headers".to_string(),
            });
        };
        tracing::debug!(status = head.status, body_len = body.len(), "response");

        if !head.is_success() {
            return Err(DaapError::HttpStatus {
                status: head.status,
                reason: head.reason,
            });
        }

        Ok(HttpResponse { head, body })
    }
}
