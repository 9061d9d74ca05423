use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

use crate::error::DaapError;
use crate::types::DaapShare;

/// Discovery events
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    /// A new share appeared on the network
    Added(DaapShare),
    /// A share's announcement changed (name, address or TXT records)
    Updated(DaapShare),
    /// A share went offline; carries its mDNS service name
    Removed(String),
}

/// mDNS browser for DAAP shares
pub struct ShareBrowser;

impl ShareBrowser {
    /// Create a new share browser
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Start browsing for shares
    ///
    /// # Errors
    ///
    /// Returns an error if the mDNS daemon cannot be initialized.
    pub fn browse(self) -> Result<impl Stream<Item = DiscoveryEvent>, DaapError> {
        ShareBrowserStream::new()
    }
}

impl Default for ShareBrowser {
    fn default() -> Self {
        Self::new()
    }
}

struct ShareBrowserStream {
    mdns: mdns_sd::ServiceDaemon,
    stream: Box<dyn Stream<Item = mdns_sd::ServiceEvent> + Send + Unpin>,
    known_shares: HashMap<String, DaapShare>,
}

impl ShareBrowserStream {
    fn new() -> Result<Self, DaapError> {
        let mdns = mdns_sd::ServiceDaemon::new().map_err(|e| DaapError::DiscoveryFailed {
            message: format!("failed to create mDNS daemon: {e}"),
        })?;

        let receiver =
            mdns.browse(super::DAAP_SERVICE_TYPE)
                .map_err(|e| DaapError::DiscoveryFailed {
                    message: format!("failed to browse: {e}"),
                })?;

        let stream = Box::new(receiver.into_stream());

        Ok(Self {
            mdns,
            stream,
            known_shares: HashMap::new(),
        })
    }

    fn process_event(&mut self, event: mdns_sd::ServiceEvent) -> Option<DiscoveryEvent> {
        match event {
            mdns_sd::ServiceEvent::ServiceResolved(info) => self.handle_resolved(&info),
            mdns_sd::ServiceEvent::ServiceRemoved(_, fullname) => self.handle_removed(&fullname),
            _ => None,
        }
    }

    fn handle_resolved(&mut self, info: &mdns_sd::ServiceInfo) -> Option<DiscoveryEvent> {
        let service_name = info.get_fullname().to_string();

        let txt_records: HashMap<String, String> = info
            .get_properties()
            .iter()
            .map(|prop| (prop.key().to_string(), prop.val_str().to_string()))
            .collect();

        // iTunes announces the display name in "Machine Name"; fall back to
        // the instance part of the service name
        let name = txt_records
            .get("Machine Name")
            .cloned()
            .or_else(|| service_name.split('.').next().map(ToString::to_string))
            .unwrap_or_else(|| "DAAP Share".to_string());

        let address = info.get_addresses().iter().next().copied()?;

        let share = DaapShare {
            service_name: service_name.clone(),
            name,
            address,
            port: info.get_port(),
            password_protected: password_flag(&txt_records),
            txt_records,
        };

        let event = if self.known_shares.contains_key(&service_name) {
            DiscoveryEvent::Updated(share.clone())
        } else {
            tracing::debug!(share = %share.name, address = %share.address, "share discovered");
            DiscoveryEvent::Added(share.clone())
        };

        self.known_shares.insert(service_name, share);

        Some(event)
    }

    fn handle_removed(&mut self, fullname: &str) -> Option<DiscoveryEvent> {
        self.known_shares
            .remove(fullname)
            .map(|_| DiscoveryEvent::Removed(fullname.to_string()))
    }
}

/// Interpret the `Password` TXT record as iTunes writes it
fn password_flag(txt_records: &HashMap<String, String>) -> bool {
    txt_records
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("password"))
        .is_some_and(|(_, value)| value == "1" || value.eq_ignore_ascii_case("true"))
}

impl Stream for ShareBrowserStream {
    type Item = DiscoveryEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let event = match Pin::new(&mut self.stream).poll_next(cx) {
                Poll::Ready(Some(event)) => event,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            };

            if let Some(discovery_event) = self.process_event(event) {
                return Poll::Ready(Some(discovery_event));
            }
        }
    }
}

impl Drop for ShareBrowserStream {
    fn drop(&mut self) {
        let _ = self.mdns.stop_browse(super::DAAP_SERVICE_TYPE);
        let _ = self.mdns.shutdown();
    }
}
