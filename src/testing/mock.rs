//! In-process DAAP server for tests

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::protocol::dmap::DmapWriter;
use crate::types::{DaapShare, TrackRecord};

/// Session id the mock hands out on login
pub const MOCK_SESSION_ID: u32 = 42;
/// Revision number the mock reports
pub const MOCK_REVISION: u32 = 2;
/// Database id of the single mock database
pub const MOCK_DATABASE_ID: u32 = 1;

/// One playlist served by the mock
#[derive(Debug, Clone)]
pub struct MockPlaylist {
    /// Container id
    pub id: u32,
    /// Playlist name
    pub name: String,
    /// Item ids of the member tracks, in playlist order
    pub item_ids: Vec<u32>,
}

/// Behavior of a [`MockShare`]
#[derive(Debug, Clone, Default)]
pub struct MockShareConfig {
    /// Share name reported in server-info
    pub name: String,
    /// Require this password on every request after server-info
    pub password: Option<String>,
    /// Tracks in the song listing
    pub tracks: Vec<TrackRecord>,
    /// Playlists after the base playlist
    pub playlists: Vec<MockPlaylist>,
    /// Raw bytes served for a track download, by item id
    pub track_data: HashMap<u32, Vec<u8>>,
    /// Serve listing bodies with chunked transfer encoding
    pub chunked_listings: bool,
    /// Close the connection without answering after this many requests
    pub close_after_requests: Option<usize>,
    /// Hold requests forever (socket open, no response) after this many
    pub stall_after_requests: Option<usize>,
    /// Answer range requests with a full-body 200, like servers that do not
    /// implement `Range`
    pub ignore_range: bool,
}

impl MockShareConfig {
    /// A config named `name` with no tracks
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// One request the mock received, for assertions
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method
    pub method: String,
    /// Path plus query string
    pub path: String,
    /// Headers in arrival order
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Case-insensitive header lookup
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

struct ServerState {
    config: MockShareConfig,
    requests: Mutex<Vec<RecordedRequest>>,
    request_count: AtomicUsize,
}

/// An in-process DAAP share bound to a loopback port
pub struct MockShare {
    addr: SocketAddr,
    state: Arc<ServerState>,
    task: JoinHandle<()>,
}

impl MockShare {
    /// Bind a listener and start serving `config`.
    ///
    /// # Errors
    ///
    /// Returns a network error if the loopback bind fails.
    pub async fn start(config: MockShareConfig) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(ServerState {
            config,
            requests: Mutex::new(Vec::new()),
            request_count: AtomicUsize::new(0),
        });

        let accept_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    let _ = handle_connection(stream, state).await;
                });
            }
        });

        Ok(Self { addr, state, task })
    }

    /// Address the mock is listening on
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// A [`DaapShare`] pointing at the mock, as discovery would produce it
    #[must_use]
    pub fn share(&self) -> DaapShare {
        DaapShare {
            service_name: format!("{}._daap._tcp.local.", self.state.config.name),
            name: self.state.config.name.clone(),
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: self.addr.port(),
            password_protected: self.state.config.password.is_some(),
            txt_records: HashMap::new(),
        }
    }

    /// Snapshot of every request received so far
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Requests whose path starts with `prefix`
    #[must_use]
    pub fn requests_for(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }
}

impl Drop for MockShare {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<ServerState>) -> std::io::Result<()> {
    loop {
        let Some(request) = read_request(&mut stream).await? else {
            return Ok(());
        };

        state
            .requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let seen = state.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(limit) = state.config.close_after_requests {
            if seen > limit {
                // Fault injection: hang up without answering
                return Ok(());
            }
        }
        if let Some(limit) = state.config.stall_after_requests {
            if seen > limit {
                // Fault injection: keep the socket open but never answer
                std::future::pending::<()>().await;
            }
        }

        if !authorized(&state.config, &request) {
            write_response(&mut stream, 401, "Unauthorized", &[], false).await?;
            continue;
        }

        route(&mut stream, &state.config, &request).await?;
    }
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<RecordedRequest>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]);
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split(' ');
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    let headers = lines
        .filter_map(|line| {
            line.split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    Ok(Some(RecordedRequest {
        method,
        path,
        headers,
    }))
}

fn authorized(config: &MockShareConfig, request: &RecordedRequest) -> bool {
    let Some(password) = &config.password else {
        return true;
    };
    if request.path.starts_with("/server-info") {
        return true;
    }
    let Some(value) = request.header("Authorization") else {
        return false;
    };
    let Some(token) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = BASE64.decode(token) else {
        return false;
    };
    let Ok(text) = String::from_utf8(decoded) else {
        return false;
    };
    text.split_once(':')
        .is_some_and(|(_, supplied)| supplied == password)
}

async fn route(
    stream: &mut TcpStream,
    config: &MockShareConfig,
    request: &RecordedRequest,
) -> std::io::Result<()> {
    let path = request.path.split('?').next().unwrap_or("");
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match segments.as_slice() {
        ["server-info"] => {
            let body = server_info_body(config);
            write_response(stream, 200, "OK", &body, config.chunked_listings).await
        }
        ["login"] => {
            let body = login_body();
            write_response(stream, 200, "OK", &body, config.chunked_listings).await
        }
        ["update"] => {
            let body = update_body();
            write_response(stream, 200, "OK", &body, config.chunked_listings).await
        }
        ["databases"] => {
            let body = databases_body(config);
            write_response(stream, 200, "OK", &body, config.chunked_listings).await
        }
        ["databases", _, "items"] => {
            let body = items_body(config);
            write_response(stream, 200, "OK", &body, config.chunked_listings).await
        }
        ["databases", _, "containers"] => {
            let body = containers_body(config);
            write_response(stream, 200, "OK", &body, config.chunked_listings).await
        }
        ["databases", _, "containers", playlist_id, "items"] => {
            let id: u32 = playlist_id.parse().unwrap_or(0);
            match config.playlists.iter().find(|p| p.id == id) {
                Some(playlist) => {
                    let body = playlist_items_body(playlist);
                    write_response(stream, 200, "OK", &body, config.chunked_listings).await
                }
                None => write_response(stream, 404, "Not Found", &[], false).await,
            }
        }
        ["databases", _, "items", file] => {
            let id: u32 = file
                .split('.')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            match config.track_data.get(&id) {
                Some(data) => serve_track(stream, request, data, config.ignore_range).await,
                None => write_response(stream, 404, "Not Found", &[], false).await,
            }
        }
        ["logout"] => write_response(stream, 204, "No Content", &[], false).await,
        _ => write_response(stream, 404, "Not Found", &[], false).await,
    }
}

async fn serve_track(
    stream: &mut TcpStream,
    request: &RecordedRequest,
    data: &[u8],
    ignore_range: bool,
) -> std::io::Result<()> {
    if ignore_range {
        return write_response(stream, 200, "OK", data, false).await;
    }

    let offset = request
        .header("Range")
        .and_then(|v| v.strip_prefix("bytes="))
        .and_then(|v| v.strip_suffix('-'))
        .and_then(|v| v.parse::<usize>().ok());

    match offset {
        Some(start) if start <= data.len() => {
            write_response(stream, 206, "Partial Content", &data[start..], false).await
        }
        Some(_) => write_response(stream, 416, "Range Not Satisfiable", &[], false).await,
        None => write_response(stream, 200, "OK", data, false).await,
    }
}

async fn write_response(
    stream: &mut TcpStream,
    status: u16,
    reason: &str,
    body: &[u8],
    chunked: bool,
) -> std::io::Result<()> {
    let mut head = format!("HTTP/1.1 {status} {reason}\r\n");
    head.push_str("Content-Type: application/x-dmap-tagged\r\n");
    if chunked && !body.is_empty() {
        head.push_str("Transfer-Encoding: chunked\r\n\r\n");
        stream.write_all(head.as_bytes()).await?;
        // Small chunks so reassembly across chunk boundaries gets exercised
        for piece in body.chunks(13) {
            stream
                .write_all(format!("{:x}\r\n", piece.len()).as_bytes())
                .await?;
            stream.write_all(piece).await?;
            stream.write_all(b"\r\n").await?;
        }
        stream.write_all(b"0\r\n\r\n").await?;
    } else {
        head.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));
        stream.write_all(head.as_bytes()).await?;
        stream.write_all(body).await?;
    }
    stream.flush().await
}

fn server_info_body(config: &MockShareConfig) -> Vec<u8> {
    let mut writer = DmapWriter::new();
    writer.container(b"msrv", |w| {
        w.u32(b"mstt", 200);
        w.version(b"mpro", 2, 0, 0);
        w.version(b"apro", 3, 0, 0);
        w.string(b"minm", &config.name);
        w.u8(b"mslr", u8::from(config.password.is_some()));
        w.u8(b"msau", if config.password.is_some() { 2 } else { 0 });
        w.u32(b"mstm", 1800);
        w.u32(b"msdc", 1);
    });
    writer.finish()
}

fn login_body() -> Vec<u8> {
    let mut writer = DmapWriter::new();
    writer.container(b"mlog", |w| {
        w.u32(b"mstt", 200);
        w.u32(b"mlid", MOCK_SESSION_ID);
    });
    writer.finish()
}

fn update_body() -> Vec<u8> {
    let mut writer = DmapWriter::new();
    writer.container(b"mupd", |w| {
        w.u32(b"mstt", 200);
        w.u32(b"musr", MOCK_REVISION);
    });
    writer.finish()
}

fn databases_body(config: &MockShareConfig) -> Vec<u8> {
    let mut writer = DmapWriter::new();
    writer.container(b"avdb", |w| {
        w.u32(b"mstt", 200);
        w.u8(b"muty", 0);
        w.u32(b"mtco", 1);
        w.u32(b"mrco", 1);
        w.container(b"mlcl", |listing| {
            listing.container(b"mlit", |item| {
                item.u32(b"miid", MOCK_DATABASE_ID);
                item.u64(b"mper", u64::from(MOCK_DATABASE_ID));
                item.string(b"minm", &config.name);
                #[allow(clippy::cast_possible_truncation)]
                item.u32(b"mimc", config.tracks.len() as u32);
            });
        });
    });
    writer.finish()
}

#[allow(clippy::cast_possible_truncation)]
fn items_body(config: &MockShareConfig) -> Vec<u8> {
    let mut writer = DmapWriter::new();
    writer.container(b"adbs", |w| {
        w.u32(b"mstt", 200);
        w.u8(b"muty", 0);
        w.u32(b"mtco", config.tracks.len() as u32);
        w.u32(b"mrco", config.tracks.len() as u32);
        w.container(b"mlcl", |listing| {
            for track in &config.tracks {
                listing.container(b"mlit", |item| {
                    item.u8(b"mikd", 2);
                    item.u32(b"miid", track.item_id);
                    item.u64(b"mper", track.persistent_id);
                    item.string(b"minm", &track.title);
                    item.string(b"asar", &track.artist);
                    item.string(b"asal", &track.album);
                    item.string(b"asgn", &track.genre);
                    item.string(b"asfm", &track.format);
                    item.u16(b"asbr", track.bitrate);
                    item.u32(b"astm", track.duration_ms);
                    item.u32(b"assz", track.size_bytes as u32);
                    item.u16(b"astn", track.track_number);
                    item.u16(b"astc", track.track_count);
                    item.u16(b"asyr", track.year);
                });
            }
        });
    });
    writer.finish()
}

#[allow(clippy::cast_possible_truncation)]
fn containers_body(config: &MockShareConfig) -> Vec<u8> {
    let mut writer = DmapWriter::new();
    writer.container(b"aply", |w| {
        w.u32(b"mstt", 200);
        w.u8(b"muty", 0);
        w.u32(b"mtco", config.playlists.len() as u32 + 1);
        w.u32(b"mrco", config.playlists.len() as u32 + 1);
        w.container(b"mlcl", |listing| {
            // Base playlist mirroring the whole library; clients skip it
            listing.container(b"mlit", |item| {
                item.u32(b"miid", MOCK_DATABASE_ID);
                item.string(b"minm", &config.name);
                item.u8(b"abpl", 1);
                item.u32(b"mimc", config.tracks.len() as u32);
            });
            for playlist in &config.playlists {
                listing.container(b"mlit", |item| {
                    item.u32(b"miid", playlist.id);
                    item.string(b"minm", &playlist.name);
                    item.u32(b"mimc", playlist.item_ids.len() as u32);
                });
            }
        });
    });
    writer.finish()
}

#[allow(clippy::cast_possible_truncation)]
fn playlist_items_body(playlist: &MockPlaylist) -> Vec<u8> {
    let mut writer = DmapWriter::new();
    writer.container(b"apso", |w| {
        w.u32(b"mstt", 200);
        w.u8(b"muty", 0);
        w.u32(b"mtco", playlist.item_ids.len() as u32);
        w.u32(b"mrco", playlist.item_ids.len() as u32);
        w.container(b"mlcl", |listing| {
            for (index, item_id) in playlist.item_ids.iter().enumerate() {
                listing.container(b"mlit", |item| {
                    item.u8(b"mikd", 2);
                    item.u32(b"miid", *item_id);
                    item.u32(b"mcti", index as u32 + 1);
                });
            }
        });
    });
    writer.finish()
}
