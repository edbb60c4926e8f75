//! Gateway configuration.

use std::fmt;
use std::time::Duration;

/// Used when `NETSAPIENS_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.netsapiens.com";

/// Path prefix appended to the API URL for every request.
pub const API_PREFIX: &str = "ns-api/v2";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const USER_AGENT: &str = concat!("unrelated-ns-mcp/", env!("CARGO_PKG_VERSION"));

/// Sliding-window limit on outbound requests.
///
/// `requests == 0` disables limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests: u32,
    pub per: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 100,
            per: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            requests: 0,
            per: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.requests > 0 && !self.per.is_zero()
    }
}

/// Everything the gateway needs to talk to one NetSapiens deployment.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Deployment root, e.g. `https://api.netsapiens.com` (without `/ns-api/v2`).
    pub api_url: String,
    /// Static bearer token.
    pub api_token: String,
    pub timeout: Duration,
    pub rate_limit: RateLimitConfig,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_token: api_token.into(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit: RateLimitConfig::default(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// `{api_url}/ns-api/v2`, tolerating a trailing slash on `api_url`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}/{API_PREFIX}", self.api_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}
