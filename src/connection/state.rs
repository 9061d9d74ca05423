//! Connection phases and events

/// Phase of the login/browse sequence.
///
/// The sequence is strictly linear: every phase is entered at most once per
/// connection attempt, in declaration order, ending at [`Done`](Self::Done).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Not connected
    Idle,
    /// Fetching `/server-info`
    ServerInfo,
    /// Waiting for the user to supply a password
    Password,
    /// Logging in to obtain a session id
    Login,
    /// Fetching the server revision number
    RevisionNumber,
    /// Fetching the database listing
    DatabaseInfo,
    /// Fetching and inserting the song listing
    Songs,
    /// Fetching the playlist listing
    Playlists,
    /// Fetching the entries of each playlist
    PlaylistEntries,
    /// Fully connected; the library is committed
    Done,
    /// Logging out
    Logout,
}

impl ConnectionPhase {
    /// Fraction of the connect sequence completed, 0.0 to 1.0
    #[must_use]
    pub fn progress(self) -> f32 {
        match self {
            ConnectionPhase::Idle => 0.0,
            ConnectionPhase::ServerInfo => 0.1,
            ConnectionPhase::Password => 0.2,
            ConnectionPhase::Login => 0.3,
            ConnectionPhase::RevisionNumber => 0.4,
            ConnectionPhase::DatabaseInfo => 0.5,
            ConnectionPhase::Songs => 0.6,
            ConnectionPhase::Playlists => 0.8,
            ConnectionPhase::PlaylistEntries => 0.9,
            ConnectionPhase::Done | ConnectionPhase::Logout => 1.0,
        }
    }

    /// Whether a connect attempt is in flight
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(
            self,
            ConnectionPhase::Idle | ConnectionPhase::Done | ConnectionPhase::Logout
        )
    }

    /// Whether the connection is fully established
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionPhase::Done)
    }

    /// Phase name for logs and state errors
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionPhase::Idle => "idle",
            ConnectionPhase::ServerInfo => "server-info",
            ConnectionPhase::Password => "password",
            ConnectionPhase::Login => "login",
            ConnectionPhase::RevisionNumber => "revision-number",
            ConnectionPhase::DatabaseInfo => "database-info",
            ConnectionPhase::Songs => "songs",
            ConnectionPhase::Playlists => "playlists",
            ConnectionPhase::PlaylistEntries => "playlist-entries",
            ConnectionPhase::Done => "done",
            ConnectionPhase::Logout => "logout",
        }
    }
}

/// Connection events
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The connect sequence moved to a new phase
    PhaseChanged {
        /// The phase just entered
        phase: ConnectionPhase,
        /// Overall progress, 0.0 to 1.0
        progress: f32,
    },
    /// A connect attempt finished. Emitted exactly once per attempt.
    OperationDone {
        /// Whether the attempt succeeded
        success: bool,
        /// Failure description when `success` is false
        reason: Option<String>,
    },
    /// The connection was torn down
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let order = [
            ConnectionPhase::Idle,
            ConnectionPhase::ServerInfo,
            ConnectionPhase::Password,
            ConnectionPhase::Login,
            ConnectionPhase::RevisionNumber,
            ConnectionPhase::DatabaseInfo,
            ConnectionPhase::Songs,
            ConnectionPhase::Playlists,
            ConnectionPhase::PlaylistEntries,
            ConnectionPhase::Done,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].progress() < pair[1].progress(), "{pair:?}");
        }
    }

    #[test]
    fn test_phase_classification() {
        assert!(ConnectionPhase::Songs.is_active());
        assert!(!ConnectionPhase::Idle.is_active());
        assert!(!ConnectionPhase::Done.is_active());
        assert!(ConnectionPhase::Done.is_connected());
        assert!(!ConnectionPhase::Login.is_connected());
    }
}
