// Upstream API access
//
// One authenticated client per process; auth headers are injected at
// construction, never per call. Every call goes through the rate guard, so
// callers get global spacing for free and must not work around it.

pub mod client;

pub use client::ApiClient;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error types for upstream API calls.
///
/// A `Status` failure is a per-call outcome: the caller logs it and moves on
/// to the next unit of work. Nothing here aborts a batch.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}
