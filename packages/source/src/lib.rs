#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Police API access and cached ingestion.
//!
//! [`PoliceApi`] is the seam to the remote service ([`HttpPoliceApi`] in
//! production, scripted fakes in tests). [`IngestClient`] puts a
//! [`police_map_cache::RegionCache`] in front of it so every
//! `(region, period, kind)` is fetched from the network at most once, and
//! [`normalize`] turns raw API entries into typed records.

pub mod api;
pub mod client;
pub mod http;
pub mod normalize;
pub mod progress;

pub use api::{PoliceApi, QueryArea};
pub use client::{Fetched, IngestClient};
pub use http::HttpPoliceApi;
pub use normalize::FromRaw;
pub use progress::{NullProgress, ProgressCallback, null_progress};

/// Errors that can occur talking to the police API.
///
/// [`IngestClient`] never surfaces these to its caller: a failed query
/// becomes an empty collection. They exist for [`PoliceApi`]
/// implementations and for logging.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The body was valid JSON but not the expected shape.
    #[error("Unexpected response body: {message}")]
    UnexpectedBody {
        /// Description of what went wrong.
        message: String,
    },
}
