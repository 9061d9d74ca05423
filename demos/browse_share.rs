//! Connect to the first discovered share and print its library

use std::sync::Arc;
use std::time::Duration;

use daap::{DaapConfig, DaapConnection, MemorySink, NoPassword, scan};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let shares = scan(Duration::from_secs(5)).await?;
    let Some(share) = shares.into_iter().next() else {
        println!("No shares found.");
        return Ok(());
    };

    println!("Connecting to {}...", share.name);
    let connection = DaapConnection::new(share, DaapConfig::default());
    let sink = Arc::new(MemorySink::new());
    connection.connect(sink.clone(), &NoPassword).await?;

    let tracks = sink.tracks(&connection.source_uri());
    println!("{} tracks:", tracks.len());
    for track in &tracks {
        println!("  {} - {} ({})", track.artist, track.title, track.album);
    }
    for playlist in connection.playlists() {
        println!("Playlist {:?} with {} entries", playlist.name, playlist.uris.len());
    }

    connection.disconnect().await;
    Ok(())
}
