//! Remote share description produced by discovery

use std::collections::HashMap;
use std::net::IpAddr;

/// A DAAP share found on the local network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaapShare {
    /// mDNS service name, unique per share and stable across TXT updates
    pub service_name: String,
    /// Human-readable share name shown to the user
    pub name: String,
    /// Resolved host address
    pub address: IpAddr,
    /// TCP port of the DAAP server
    pub port: u16,
    /// Whether the share requires a password before login
    pub password_protected: bool,
    /// Raw TXT records from the mDNS announcement
    pub txt_records: HashMap<String, String>,
}

impl DaapShare {
    /// `host:port` string for the HTTP `Host` header and TCP connect
    #[must_use]
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Base URI for tracks on this share, e.g. `daap://10.0.0.2:3689`
    #[must_use]
    pub fn base_uri(&self) -> String {
        format!("daap://{}:{}", self.address, self.port)
    }
}
