//! Typed gateway to the NetSapiens `ns-api/v2` REST API.
//!
//! Every operation is a single HTTP round trip. Failures never escape as `Err`: they are folded
//! into an [`OperationResult`] with `success: false`, so callers always get a value back.
//!
//! This crate contains **no** MCP protocol logic; see `unrelated-ns-mcp` for the tool surface.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod operations;
pub mod params;
pub mod rate_limit;
pub mod sanitize;

pub use client::NsApiClient;
pub use config::{GatewayConfig, RateLimitConfig};
pub use envelope::{ConnectionStatus, OperationResult};
pub use error::{NsApiError, Result};
pub use reqwest::Method;
