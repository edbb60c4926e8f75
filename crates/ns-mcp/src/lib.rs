//! MCP tool surface for the NetSapiens `ns-api/v2` REST API.
//!
//! [`catalog`] defines the fixed tool set, [`dispatch`] turns a `tools/call` into one gateway
//! operation, and [`stdio`] speaks newline-delimited JSON-RPC on a pair of byte streams.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod semantics;
pub mod stdio;

pub use catalog::{Operation, build_catalog};
pub use config::{LogFormat, ServerArgs};
pub use dispatch::Dispatcher;
pub use error::{McpServerError, Result};
pub use stdio::serve;
