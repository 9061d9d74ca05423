//! Connection management
//!
//! A [`DaapConnection`] logs in to one share, walks its database into a
//! [`DatabaseSink`](crate::library::DatabaseSink) and stays live for track
//! streaming until disconnected.

mod auth;
mod listing;
mod session;
mod state;


pub use auth::{Authenticator, NoPassword, StaticPassword};
pub use session::DaapConnection;
pub use state::{ConnectionEvent, ConnectionPhase};
