//! mDNS discovery of DAAP shares
//!
//! Shares announce themselves as `_daap._tcp` services; the TXT records carry
//! the display name and whether a password is required.

mod browser;

pub use browser::{DiscoveryEvent, ShareBrowser};

use std::time::Duration;

use futures::Stream;

use crate::error::DaapError;
use crate::types::DaapShare;

/// Service type for DAAP share discovery
pub const DAAP_SERVICE_TYPE: &str = "_daap._tcp.local.";

/// Discover DAAP shares continuously.
///
/// Returns a stream that yields shares as they appear, change and vanish.
/// The stream continues until dropped.
///
/// # Example
///
/// ```rust,no_run
/// use daap::discovery::{discover, DiscoveryEvent};
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), daap::DaapError> {
/// let mut shares = discover()?;
///
/// while let Some(event) = shares.next().await {
///     match event {
///         DiscoveryEvent::Added(share) => {
///             println!("Found: {}", share.name);
///         }
///         DiscoveryEvent::Removed(service_name) => {
///             println!("Lost: {service_name}");
///         }
///         _ => {}
///     }
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if the mDNS daemon cannot be initialized.
pub fn discover() -> Result<impl Stream<Item = DiscoveryEvent>, DaapError> {
    ShareBrowser::new().browse()
}

/// Scan for shares with a timeout.
///
/// Performs a one-shot scan and returns every share visible when the timeout
/// expires.
///
/// # Errors
///
/// Returns an error if the mDNS daemon cannot be initialized.
pub async fn scan(timeout: Duration) -> Result<Vec<DaapShare>, DaapError> {
    use futures::StreamExt;
    use std::collections::HashMap;

    let stream = discover()?;
    let mut shares: HashMap<String, DaapShare> = HashMap::new();
    let deadline = tokio::time::Instant::now() + timeout;

    tokio::pin!(stream);

    loop {
        tokio::select! {
            () = tokio::time::sleep_until(deadline) => break,
            event = stream.next() => {
                match event {
                    Some(DiscoveryEvent::Added(share) | DiscoveryEvent::Updated(share)) => {
                        shares.insert(share.service_name.clone(), share);
                    }
                    Some(DiscoveryEvent::Removed(service_name)) => {
                        shares.remove(&service_name);
                    }
                    None => break,
                }
            }
        }
    }

    Ok(shares.into_values().collect())
}
