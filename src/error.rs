use std::io;
use thiserror::Error;

/// Errors produced while decoding DMAP content
#[derive(Debug, Error)]
pub enum DmapError {
    /// Buffer ended before a complete chunk header or payload
    #[error("unexpected end of data: need {needed} more bytes")]
    Truncated {
        /// How many bytes were missing
        needed: usize,
    },

    /// A declared chunk length exceeds the bytes remaining in its parent
    #[error("chunk '{code}' declares {declared} bytes but only {available} remain")]
    LengthOverrun {
        /// The 4-character content code
        code: String,
        /// The declared payload length
        declared: usize,
        /// Bytes actually remaining
        available: usize,
    },

    /// A payload did not match the size its content type requires
    #[error("chunk '{code}' has invalid payload size {size} for its type")]
    InvalidPayloadSize {
        /// The 4-character content code
        code: String,
        /// The payload size found on the wire
        size: usize,
    },

    /// A string payload was not valid UTF-8
    #[error("chunk '{code}' contains invalid UTF-8")]
    InvalidString {
        /// The 4-character content code
        code: String,
    },

    /// The caller expected a specific chunk that was not present
    #[error("expected chunk '{code}' not found in response")]
    MissingChunk {
        /// The 4-character content code that was expected
        code: String,
    },

    /// Containers nested deeper than the parser allows
    #[error("containers nested deeper than {limit} levels")]
    NestingTooDeep {
        /// The depth limit that was exceeded
        limit: usize,
    },
}

/// Errors that can occur during DAAP operations
#[derive(Debug, Error)]
pub enum DaapError {
    // ===== Discovery Errors =====
    /// mDNS discovery failed
    #[error("discovery failed: {message}")]
    DiscoveryFailed {
        /// Description of the failure
        message: String,
    },

    // ===== Transport Errors =====
    /// Failed to establish a TCP connection to the share
    #[error("connection failed to {share_name}: {message}")]
    ConnectionFailed {
        /// The name of the share
        share_name: String,
        /// Description of the failure
        message: String,
        /// The underlying source of the error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The connection was closed while an exchange was in flight
    #[error("share disconnected: {share_name}")]
    Disconnected {
        /// The name of the share
        share_name: String,
    },

    /// Connection timed out
    #[error("connection timeout after {duration:?}")]
    ConnectionTimeout {
        /// The duration of the timeout
        duration: std::time::Duration,
    },

    /// Network I/O error
    #[error("network error: {0}")]
    NetworkError(#[from] io::Error),

    // ===== Protocol Errors =====
    /// Malformed HTTP response, oversized headers, or chunked-encoding
    /// syntax violation
    #[error("protocol error: {message}")]
    ProtocolError {
        /// Description of the violation
        message: String,
    },

    /// The server answered with a non-success HTTP status
    #[error("server returned {status} {reason}")]
    HttpStatus {
        /// The HTTP status code
        status: u16,
        /// The reason phrase from the status line
        reason: String,
    },

    /// DMAP decoding failed
    #[error("DMAP error: {0}")]
    Dmap(#[from] DmapError),

    // ===== Authentication Errors =====
    /// The share rejected our credentials, or the user declined to
    /// provide a password
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the failure
        message: String,
    },

    // ===== State Errors =====
    /// Operation not valid in the current connection state
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of why the state is invalid
        message: String,
        /// The current state
        current_state: String,
    },

    /// The operation was cancelled by a disconnect
    #[error("operation cancelled by disconnect")]
    Cancelled,

    /// The originating connection for a stream no longer exists
    #[error("originating connection is gone")]
    ConnectionGone,
}

impl DaapError {
    /// Check if this error is an authentication failure
    ///
    /// Callers use this to re-prompt for credentials instead of
    /// surfacing a generic failure.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::AuthenticationFailed { .. } => true,
            Self::HttpStatus { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Check if this error is recoverable by a fresh user-initiated connect
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::NetworkError(_) | Self::Disconnected { .. }
        )
    }

    /// Human-readable reason string for completion callbacks
    #[must_use]
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Result type alias for DAAP operations
pub type Result<T> = std::result::Result<T, DaapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DaapError::HttpStatus {
            status: 404,
            reason: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "server returned 404 Not Found");
    }

    #[test]
    fn test_auth_classification() {
        let forbidden = DaapError::HttpStatus {
            status: 403,
            reason: "Forbidden".to_string(),
        };
        assert!(forbidden.is_auth_failure());

        let declined = DaapError::AuthenticationFailed {
            message: "user cancelled".to_string(),
        };
        assert!(declined.is_auth_failure());

        let not_found = DaapError::HttpStatus {
            status: 404,
            reason: "Not Found".to_string(),
        };
        assert!(!not_found.is_auth_failure());
    }

    #[test]
    fn test_error_is_recoverable() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let err: DaapError = io_err.into();
        assert!(err.is_recoverable());

        let auth = DaapError::AuthenticationFailed {
            message: "bad password".to_string(),
        };
        assert!(!auth.is_recoverable());
    }

    #[test]
    fn test_dmap_error_propagates() {
        let err: DaapError = DmapError::Truncated { needed: 4 }.into();
        assert!(matches!(err, DaapError::Dmap(_)));
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DaapError>();
    }
}
