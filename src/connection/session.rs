//! One connection to a share and its linear connect sequence

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{Mutex as AsyncMutex, broadcast, watch};

use super::auth::Authenticator;
use super::listing;
use super::state::{ConnectionEvent, ConnectionPhase};
use crate::error::{DaapError, Result};
use crate::library::DatabaseSink;
use crate::protocol::auth::generate_validation;
use crate::protocol::dmap::{ContentCodeRegistry, DmapItem, parse};
use crate::protocol::http::{HttpClient, HttpRequest, HttpResponse, Method};
use crate::types::{DaapConfig, DaapShare, Playlist};

/// Fixed index into the validation hash table, sent as
/// `Client-DAAP-Access-Index`
const HASH_SELECT: u8 = 2;

/// User name for HTTP Basic credentials; DAAP servers only check the password
const BASIC_AUTH_USER: &str = "iTunes_4.6";

#[derive(Debug)]
struct SessionState {
    phase: ConnectionPhase,
    daap_major: u16,
    session_id: Option<u32>,
    revision: u32,
    database_id: Option<u32>,
    password: Option<String>,
    server_name: String,
    playlists: Vec<Playlist>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            daap_major: 0,
            session_id: None,
            revision: 0,
            database_id: None,
            password: None,
            server_name: String::new(),
            playlists: Vec::new(),
        }
    }
}

/// A client connection to one DAAP share.
///
/// [`connect`](Self::connect) drives the whole login and browse sequence:
/// server info, optional password, login, revision number, database listing,
/// song listing into the sink, playlists and their entries. The sequence is
/// linear and runs at most once at a time; progress is observable through
/// [`subscribe`](Self::subscribe).
///
/// Connections are created inside an [`Arc`] so track streams can hold a weak
/// back-reference without keeping a closed connection alive.
pub struct DaapConnection {
    config: DaapConfig,
    share: DaapShare,
    registry: ContentCodeRegistry,
    http: AsyncMutex<HttpClient>,
    state: RwLock<SessionState>,
    request_seq: AtomicU32,
    events: broadcast::Sender<ConnectionEvent>,
    cancel: watch::Sender<bool>,
    sink: RwLock<Option<Arc<dyn DatabaseSink>>>,
}

impl DaapConnection {
    /// Create a connection for `share`. Nothing touches the network until
    /// [`connect`](Self::connect).
    #[must_use]
    pub fn new(share: DaapShare, config: DaapConfig) -> Arc<Self> {
        let http = HttpClient::new(share.name.clone(), share.host_port());
        let (events, _) = broadcast::channel(32);
        let (cancel, _) = watch::channel(false);
        Arc::new(Self {
            config,
            share,
            registry: ContentCodeRegistry::default(),
            http: AsyncMutex::new(http),
            state: RwLock::new(SessionState::default()),
            request_seq: AtomicU32::new(0),
            events,
            cancel,
            sink: RwLock::new(None),
        })
    }

    /// The share this connection targets
    #[must_use]
    pub fn share(&self) -> &DaapShare {
        &self.share
    }

    pub(crate) fn config(&self) -> &DaapConfig {
        &self.config
    }

    /// Subscribe to connection events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Current phase of the connect sequence
    #[must_use]
    pub fn phase(&self) -> ConnectionPhase {
        self.state_ref().phase
    }

    /// Whether the full sequence has completed
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.phase().is_connected()
    }

    /// Session id obtained at login
    #[must_use]
    pub fn session_id(&self) -> Option<u32> {
        self.state_ref().session_id
    }

    /// Server revision number obtained after login
    #[must_use]
    pub fn revision(&self) -> u32 {
        self.state_ref().revision
    }

    /// Name the server reported for itself in server-info
    #[must_use]
    pub fn server_name(&self) -> String {
        self.state_ref().server_name.clone()
    }

    /// Playlists fetched during connect, excluding the base playlist
    #[must_use]
    pub fn playlists(&self) -> Vec<Playlist> {
        self.state_ref().playlists.clone()
    }

    /// Source URI under which this share's tracks are filed in the sink
    #[must_use]
    pub fn source_uri(&self) -> String {
        self.share.base_uri()
    }

    /// Run the connect sequence to completion.
    ///
    /// On success the sink holds the committed library and
    /// [`is_connected`](Self::is_connected) is true. On failure everything
    /// staged in the sink is rolled back and the connection returns to idle.
    /// One `OperationDone` event is emitted either way.
    ///
    /// # Errors
    ///
    /// Network, protocol, decode and authentication failures, a sequence
    /// running past the configured connection timeout, and connecting while
    /// another attempt is active all fail with their respective variants.
    pub async fn connect(
        &self,
        sink: Arc<dyn DatabaseSink>,
        authenticator: &dyn Authenticator,
    ) -> Result<()> {
        {
            let state = self.state_ref();
            if state.phase.is_active() || state.phase.is_connected() {
                return Err(DaapError::InvalidState {
                    message: "connect while a connection is active".to_string(),
                    current_state: state.phase.as_str().to_string(),
                });
            }
        }

        self.cancel.send_replace(false);
        self.request_seq.store(0, Ordering::SeqCst);
        *self.sink_slot() = Some(Arc::clone(&sink));

        let outcome = match tokio::time::timeout(
            self.config.connection_timeout,
            self.run_sequence(sink.as_ref(), authenticator),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DaapError::ConnectionTimeout {
                duration: self.config.connection_timeout,
            }),
        };

        match &outcome {
            Ok(()) => {
                tracing::info!(share = %self.share.name, "connected");
                self.emit(ConnectionEvent::OperationDone {
                    success: true,
                    reason: None,
                });
            }
            Err(e) => {
                tracing::warn!(share = %self.share.name, error = %e, "connect failed");
                let _ = sink.rollback(&self.source_uri()).await;
                *self.sink_slot() = None;
                self.http.lock().await.close();
                *self.state_mut() = SessionState::default();
                self.emit(ConnectionEvent::OperationDone {
                    success: false,
                    reason: Some(e.reason()),
                });
            }
        }
        outcome
    }

    /// Tear the connection down.
    ///
    /// Cancels any in-flight request, attempts a best-effort logout, removes
    /// this share's tracks from the sink and returns to idle. Safe to call
    /// repeatedly; disconnecting an idle connection touches nothing but
    /// still emits `Disconnected`, so callers waiting on completion are
    /// never left hanging.
    pub async fn disconnect(&self) {
        let (phase, session_id) = {
            let state = self.state_ref();
            (state.phase, state.session_id)
        };
        if phase == ConnectionPhase::Idle {
            self.emit(ConnectionEvent::Disconnected);
            return;
        }

        self.cancel.send_replace(true);

        if let Some(session_id) = session_id {
            self.set_phase(ConnectionPhase::Logout);
            let request = self.build_request(&format!("/logout?session-id={session_id}"));
            let mut http = self.http.lock().await;
            // Best effort; the server may already be gone
            let _ = tokio::time::timeout(self.config.request_timeout, http.exchange(&request)).await;
            http.close();
        } else {
            self.http.lock().await.close();
        }

        let sink = self.sink_slot().take();
        if let Some(sink) = sink {
            let _ = sink.delete_all_for_source(&self.source_uri()).await;
        }

        *self.state_mut() = SessionState::default();
        self.emit(ConnectionEvent::Disconnected);
        tracing::info!(share = %self.share.name, "disconnected");
    }

    async fn run_sequence(
        &self,
        sink: &dyn DatabaseSink,
        authenticator: &dyn Authenticator,
    ) -> Result<()> {
        let source = self.source_uri();

        self.set_phase(ConnectionPhase::ServerInfo);
        let items = self.request_dmap("/server-info").await?;
        let info = listing::decode_server_info(&items)?;
        tracing::debug!(name = %info.name, daap_major = info.daap_major, "server info");
        {
            let mut state = self.state_mut();
            state.daap_major = info.daap_major;
            state.server_name = info.name.clone();
        }

        let protected = self.share.password_protected || info.login_required;
        if protected {
            self.set_phase(ConnectionPhase::Password);
            let Some(password) = authenticator.password_for(&self.share, false).await else {
                return Err(DaapError::AuthenticationFailed {
                    message: "no password supplied".to_string(),
                });
            };
            self.state_mut().password = Some(password);
        }

        self.set_phase(ConnectionPhase::Login);
        let session_id = loop {
            match self.request_dmap("/login").await {
                Ok(items) => break listing::decode_session_id(&items)?,
                Err(e) if e.is_auth_failure() && protected => {
                    self.set_phase(ConnectionPhase::Password);
                    let Some(password) = authenticator.password_for(&self.share, true).await
                    else {
                        return Err(DaapError::AuthenticationFailed {
                            message: "password rejected".to_string(),
                        });
                    };
                    self.state_mut().password = Some(password);
                    self.set_phase(ConnectionPhase::Login);
                }
                Err(e) if e.is_auth_failure() => {
                    return Err(DaapError::AuthenticationFailed { message: e.reason() });
                }
                Err(e) => return Err(e),
            }
        };
        self.state_mut().session_id = Some(session_id);
        tracing::debug!(session_id, "logged in");

        self.set_phase(ConnectionPhase::RevisionNumber);
        let items = self
            .request_dmap(&format!("/update?session-id={session_id}&revision-number=1"))
            .await?;
        let revision = listing::decode_revision(&items)?;
        self.state_mut().revision = revision;

        self.set_phase(ConnectionPhase::DatabaseInfo);
        let items = self
            .request_dmap(&format!(
                "/databases?session-id={session_id}&revision-number={revision}"
            ))
            .await?;
        let database_id = listing::decode_first_database(&items)?;
        self.state_mut().database_id = Some(database_id);
        sink.register_source(&source).await?;

        self.set_phase(ConnectionPhase::Songs);
        let items = self
            .request_dmap(&format!(
                "/databases/{database_id}/items?type=music&meta={}&session-id={session_id}&revision-number={revision}",
                self.config.song_meta
            ))
            .await?;
        let tracks = listing::decode_tracks(&items)?;
        tracing::info!(count = tracks.len(), "song listing decoded");

        let base = self.share.base_uri();
        let mut track_uris = HashMap::with_capacity(tracks.len());
        for mut track in tracks {
            track.uri = format!(
                "{base}/databases/{database_id}/items/{}.{}?session-id={session_id}",
                track.item_id, track.format
            );
            track_uris.insert(track.item_id, track.uri.clone());
            sink.insert_or_update_track(&source, track).await?;
        }
        sink.commit(&source).await?;

        self.set_phase(ConnectionPhase::Playlists);
        let items = self
            .request_dmap(&format!(
                "/databases/{database_id}/containers?meta=dmap.itemid,dmap.itemname,dmap.persistentid,daap.baseplaylist&session-id={session_id}&revision-number={revision}"
            ))
            .await?;
        let heads = listing::decode_playlists(&items)?;

        self.set_phase(ConnectionPhase::PlaylistEntries);
        let mut playlists = Vec::new();
        for head in heads.into_iter().filter(|h| !h.is_base) {
            let items = self
                .request_dmap(&format!(
                    "/databases/{database_id}/containers/{}/items?meta=dmap.itemid&session-id={session_id}&revision-number={revision}",
                    head.id
                ))
                .await?;
            let ids = listing::decode_playlist_item_ids(&items)?;
            let uris = ids
                .iter()
                .filter_map(|id| track_uris.get(id).cloned())
                .collect();
            playlists.push(Playlist {
                id: head.id,
                name: head.name,
                uris,
            });
        }
        self.state_mut().playlists = playlists;

        self.set_phase(ConnectionPhase::Done);
        Ok(())
    }

    /// Build a request for `path` with the full DAAP header set.
    ///
    /// Each call consumes one request sequence number; the validation hash is
    /// attached once the server's protocol version is known.
    pub(crate) fn build_request(&self, path: &str) -> HttpRequest {
        let seq = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let (daap_major, password) = {
            let state = self.state_ref();
            (state.daap_major, state.password.clone())
        };

        let mut request = HttpRequest::new(Method::Get, path)
            .header("Host", self.share.host_port())
            .header("Accept", "*/*")
            .header("User-Agent", self.config.user_agent.clone())
            .header("Client-DAAP-Version", self.config.version_string())
            .header("Client-DAAP-Access-Index", HASH_SELECT.to_string());

        if daap_major >= 3 {
            request = request.header("Client-DAAP-Request-ID", seq.to_string());
        }
        if daap_major > 0 {
            // v2 servers ignore the request id; the hasher mixes it in only
            // for v3
            let request_id = if daap_major >= 3 { seq } else { 0 };
            request = request.header(
                "Client-DAAP-Validation",
                generate_validation(daap_major, path, HASH_SELECT, request_id),
            );
        }
        if let Some(password) = password {
            request = request.basic_auth(BASIC_AUTH_USER, &password);
        }
        request
    }

    async fn request_dmap(&self, path: &str) -> Result<Vec<DmapItem>> {
        let response = self.exchange(path).await?;
        Ok(parse(&response.body, &self.registry)?)
    }

    async fn exchange(&self, path: &str) -> Result<HttpResponse> {
        if *self.cancel.borrow() {
            return Err(DaapError::Cancelled);
        }
        let request = self.build_request(path);
        let mut cancel_rx = self.cancel.subscribe();
        let mut http = self.http.lock().await;

        enum Outcome {
            Done(Result<HttpResponse>),
            TimedOut,
            Cancelled,
        }

        let outcome = tokio::select! {
            result = tokio::time::timeout(self.config.request_timeout, http.exchange(&request)) => {
                match result {
                    Ok(inner) => Outcome::Done(inner),
                    Err(_) => Outcome::TimedOut,
                }
            }
            _ = cancel_rx.changed() => Outcome::Cancelled,
        };

        match outcome {
            Outcome::Done(result) => result,
            Outcome::TimedOut => {
                http.close();
                Err(DaapError::ConnectionTimeout {
                    duration: self.config.request_timeout,
                })
            }
            Outcome::Cancelled => {
                http.close();
                Err(DaapError::Cancelled)
            }
        }
    }

    fn set_phase(&self, phase: ConnectionPhase) {
        self.state_mut().phase = phase;
        tracing::debug!(phase = phase.as_str(), "phase");
        self.emit(ConnectionEvent::PhaseChanged {
            phase,
            progress: phase.progress(),
        });
    }

    fn emit(&self, event: ConnectionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn state_ref(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    #[allow(clippy::type_complexity)]
    fn sink_slot(&self) -> RwLockWriteGuard<'_, Option<Arc<dyn DatabaseSink>>> {
        self.sink.write().unwrap_or_else(|e| e.into_inner())
    }
}
