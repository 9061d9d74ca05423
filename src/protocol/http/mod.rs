//! HTTP/1.1 request/response driver
//!
//! DAAP is plain HTTP with extra headers. This module provides the request
//! builder, a sans-IO incremental response codec (content-length and chunked
//! framing), and the kept-alive exchange client the session runs on.

mod client;
mod codec;
mod request;

#[cfg(test)]
mod tests;

pub use client::{HttpClient, HttpResponse};
pub use codec::{BodyProgress, Headers, HttpCodec, ResponseHead};
pub use request::{HttpRequest, Method};
