//! HTTP transport for the NetSapiens gateway.
//!
//! `NsApiClient` owns one `reqwest::Client` with the auth/content headers and timeout baked in.
//! All requests go through [`NsApiClient::execute`], the single point where a transport or
//! status failure is turned into an `NsApiError`; the `fetch_*` wrappers then fold that error
//! into an `OperationResult`.

use crate::config::{GatewayConfig, USER_AGENT};
use crate::envelope::OperationResult;
use crate::error::{NsApiError, Result};
use crate::rate_limit::RateLimiter;
use crate::sanitize::redact_url;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

/// Gateway to one NetSapiens deployment.
///
/// Cheap to clone and safe to share across tasks; nothing inside is mutated after construction
/// apart from the rate limiter's window.
#[derive(Clone)]
pub struct NsApiClient {
    inner: Arc<NsApiClientInner>,
}

struct NsApiClientInner {
    config: GatewayConfig,
    base_url: Url,
    client: Client,
    rate_limiter: Option<RateLimiter>,
}

/// One outbound call: method, path segments below `/ns-api/v2`, and query pairs.
pub(crate) struct ApiRequest<'a> {
    method: Method,
    segments: Vec<&'a str>,
    query: Vec<(&'static str, String)>,
}

impl<'a> ApiRequest<'a> {
    pub(crate) fn get(segments: &[&'a str]) -> Self {
        Self {
            method: Method::GET,
            segments: segments.to_vec(),
            query: Vec::new(),
        }
    }

    pub(crate) fn post(segments: &[&'a str]) -> Self {
        Self {
            method: Method::POST,
            segments: segments.to_vec(),
            query: Vec::new(),
        }
    }

    pub(crate) fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub(crate) fn query_opt(self, key: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }
}

impl NsApiClient {
    /// Build the gateway from a static config.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is not an absolute `http(s)` URL, if the token cannot be
    /// used as a header value, or if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url()).map_err(|e| {
            NsApiError::Config(format!("Invalid API URL '{}': {e}", config.api_url))
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(NsApiError::Config(format!(
                "Invalid API URL '{}': expected an http(s) URL",
                config.api_url
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|_| NsApiError::Config("API token is not a valid header value".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| NsApiError::Config(format!("failed to build HTTP client: {e}")))?;

        let rate_limiter = RateLimiter::new(config.rate_limit);

        Ok(Self {
            inner: Arc::new(NsApiClientInner {
                config,
                base_url,
                client,
                rate_limiter,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// `{api_url}/ns-api/v2` as parsed at construction.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve a request against the base URL. Every path segment is percent-encoded on its own,
    /// so a `/` or `?` inside a domain or user id can never change the route.
    pub(crate) fn url_for(&self, req: &ApiRequest<'_>) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(req.segments.iter().copied());
        }
        if !req.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &req.query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn execute(&self, operation: &'static str, req: &ApiRequest<'_>) -> Result<Value> {
        if let Some(limiter) = &self.inner.rate_limiter
            && !limiter.try_acquire()
        {
            let window_ms = u64::try_from(limiter.window().as_millis()).unwrap_or(u64::MAX);
            warn!(
                operation,
                max_requests = limiter.max_requests(),
                window_ms,
                "outbound rate limit exhausted; refusing request"
            );
            return Err(NsApiError::RateLimited {
                requests: self.inner.config.rate_limit.requests,
                window_ms,
            });
        }

        let url = self.url_for(req);
        let log_url = redact_url(&url);
        debug!(operation, method = %req.method, url = %log_url, "NetSapiens API request");

        let response = match self
            .inner
            .client
            .request(req.method.clone(), url.clone())
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                let err = NsApiError::from(e);
                error!(operation, url = %log_url, error = %err, "NetSapiens API request failed");
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                operation,
                status = status.as_u16(),
                status_text = status.canonical_reason().unwrap_or("Unknown"),
                body = %body,
                url = %log_url,
                "NetSapiens API request failed"
            );
            return Err(NsApiError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                let err = NsApiError::from(e);
                error!(
                    operation,
                    url = %log_url,
                    error = %err,
                    "failed to read NetSapiens API response"
                );
                return Err(err);
            }
        };
        Ok(parse_body(&bytes))
    }

    /// Run a list-returning request. A bare object is wrapped into a one-element list.
    pub(crate) async fn fetch_list(
        &self,
        operation: &'static str,
        fallback: &'static str,
        req: ApiRequest<'_>,
    ) -> OperationResult<Vec<Value>> {
        match self.execute(operation, &req).await {
            Ok(body) => OperationResult::ok(into_list(body)),
            Err(e) => OperationResult::failed(failure_text(&e, fallback), Some(Vec::new())),
        }
    }

    /// Run a single-entity request.
    pub(crate) async fn fetch_one(
        &self,
        operation: &'static str,
        fallback: &'static str,
        req: ApiRequest<'_>,
    ) -> OperationResult<Value> {
        match self.execute(operation, &req).await {
            Ok(body) => OperationResult::ok(body),
            Err(e) => OperationResult::failed(failure_text(&e, fallback), None),
        }
    }
}

fn failure_text(err: &NsApiError, fallback: &str) -> String {
    let msg = err.to_string();
    if msg.trim().is_empty() {
        fallback.to_string()
    } else {
        msg
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn into_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> NsApiClient {
        NsApiClient::new(GatewayConfig::new("https://pbx.example.net", "token")).expect("client")
    }

    #[test]
    fn url_for_encodes_each_segment() {
        let c = client();
        let url = c.url_for(&ApiRequest::get(&["domains", "a/b?c", "users", "al ice"]));
        assert_eq!(
            url.as_str(),
            "https://pbx.example.net/ns-api/v2/domains/a%2Fb%3Fc/users/al%20ice"
        );
    }

    #[test]
    fn url_for_appends_query_pairs_in_order() {
        let c = client();
        let req = ApiRequest::get(&["users"])
            .query("search", "john doe")
            .query("limit", 20)
            .query_opt("start_time", None);
        let url = c.url_for(&req);
        assert_eq!(url.path(), "/ns-api/v2/users");
        assert_eq!(url.query(), Some("search=john+doe&limit=20"));
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = NsApiClient::new(GatewayConfig::new("ftp://pbx.example.net", "t"))
            .err()
            .expect("must fail");
        assert!(matches!(err, NsApiError::Config(_)));

        let err = NsApiClient::new(GatewayConfig::new("not a url", "t"))
            .err()
            .expect("must fail");
        assert!(matches!(err, NsApiError::Config(_)));
    }

    #[test]
    fn rejects_tokens_that_are_not_header_safe() {
        let config = GatewayConfig::new("https://pbx.example.net", "bad\ntoken");
        let err = NsApiClient::new(config).err().expect("must fail");
        assert!(matches!(err, NsApiError::Config(_)));
    }

    #[test]
    fn list_normalization() {
        assert_eq!(into_list(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(into_list(json!({ "a": 1 })), vec![json!({ "a": 1 })]);
        assert!(into_list(Value::Null).is_empty());
    }

    #[test]
    fn body_parsing_tolerates_empty_and_plain_text() {
        assert_eq!(parse_body(b""), Value::Null);
        assert_eq!(parse_body(b"  \n"), Value::Null);
        assert_eq!(parse_body(br#"{"ok":true}"#), json!({ "ok": true }));
        assert_eq!(parse_body(b"done"), json!("done"));
    }

    #[test]
    fn failure_text_falls_back_when_message_is_empty() {
        let err = NsApiError::Transport(String::new());
        assert_eq!(failure_text(&err, "Failed to get user"), "Failed to get user");

        let err = NsApiError::Status { status: 404 };
        assert_eq!(
            failure_text(&err, "Failed to get user"),
            "Request failed with status code 404"
        );
    }
}
