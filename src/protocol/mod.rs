//! Wire-protocol building blocks: DMAP serialization, the validation hash,
//! and the HTTP driver the session and stream layers run on.

pub mod auth;
pub mod dmap;
pub mod http;
