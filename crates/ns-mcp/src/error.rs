//! Error types for the MCP server.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum McpServerError {
    /// Invalid process configuration (missing token, bad rate limit, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gateway construction errors
    #[error("NetSapiens API error: {0}")]
    Gateway(#[from] unrelated_ns_api::NsApiError),

    /// IO errors on the stdio transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors on the stdio transport
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, McpServerError>;
