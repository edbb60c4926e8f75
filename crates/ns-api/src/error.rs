//! Error types for the NetSapiens gateway.
//!
//! These never cross the public operation methods: `NsApiClient` folds them into an
//! `OperationResult`. They are public so construction failures can be reported by the caller.

use crate::sanitize::describe_reqwest_error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NsApiError {
    /// Invalid configuration (bad base URL, token not usable as a header value).
    #[error("config error: {0}")]
    Config(String),

    /// The remote API answered with a non-2xx status.
    #[error("Request failed with status code {status}")]
    Status { status: u16 },

    /// Transport failure (DNS, connect, TLS, timeout, body read).
    #[error("{0}")]
    Transport(String),

    /// The local outbound rate limit is exhausted.
    #[error("Rate limit exceeded: at most {requests} requests per {window_ms}ms")]
    RateLimited { requests: u32, window_ms: u64 },
}

pub type Result<T> = std::result::Result<T, NsApiError>;

impl From<reqwest::Error> for NsApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(describe_reqwest_error(value))
    }
}
