//! Command-line and environment configuration.

use crate::error::{McpServerError, Result};
use clap::builder::FalseyValueParser;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use tracing::info;
use unrelated_ns_api::config::DEFAULT_API_URL;
use unrelated_ns_api::{GatewayConfig, RateLimitConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Serve the NetSapiens API as MCP tools over stdio.
#[derive(Parser, Debug, Clone)]
#[command(name = "unrelated-ns-mcp", version)]
pub struct ServerArgs {
    /// NetSapiens API root URL (without `/ns-api/v2`).
    #[arg(long, env = "NETSAPIENS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Bearer token sent with every request.
    #[arg(long, env = "NETSAPIENS_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Verbose logging; also logs the resolved API URL at startup.
    #[arg(long, env = "DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Per-request timeout in seconds.
    #[arg(long, env = "NETSAPIENS_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Requests allowed per window; 0 disables the limit.
    #[arg(long, env = "NETSAPIENS_RATE_LIMIT_REQUESTS", default_value_t = 100)]
    pub rate_limit_requests: u32,

    /// Sliding window length in milliseconds.
    #[arg(long, env = "NETSAPIENS_RATE_LIMIT_WINDOW_MS", default_value_t = 60_000)]
    pub rate_limit_window_ms: u64,

    /// Log filter directive (`RUST_LOG` syntax). `RUST_LOG` wins when set.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl ServerArgs {
    /// Effective log filter: `--debug` raises the default level to `debug`.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        if self.debug { "debug" } else { &self.log_level }
    }

    /// With `--debug`, log the resolved API base URL. Emitted at `info` so it survives a
    /// `RUST_LOG` that overrides the debug default.
    pub fn log_resolved_api_url(&self, config: &GatewayConfig) {
        if self.debug {
            info!(api_url = %config.base_url(), "using NetSapiens API");
        }
    }

    /// Build the gateway configuration.
    ///
    /// # Errors
    ///
    /// Fails when the API token is absent or blank, when the timeout is zero, or when a rate
    /// limit is requested with a zero-length window.
    pub fn gateway_config(&self) -> Result<GatewayConfig> {
        let token = self
            .api_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                McpServerError::Config(
                    "NETSAPIENS_API_TOKEN environment variable is required".to_string(),
                )
            })?;

        if self.timeout_secs == 0 {
            return Err(McpServerError::Config(
                "timeout must be at least one second".to_string(),
            ));
        }

        let rate_limit = if self.rate_limit_requests == 0 {
            RateLimitConfig::disabled()
        } else if self.rate_limit_window_ms == 0 {
            return Err(McpServerError::Config(
                "rate limit window must be positive".to_string(),
            ));
        } else {
            RateLimitConfig {
                requests: self.rate_limit_requests,
                per: Duration::from_millis(self.rate_limit_window_ms),
            }
        };

        Ok(GatewayConfig::new(self.api_url.clone(), token)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_rate_limit(rate_limit))
    }
}
