//! Redaction helpers for anything that ends up in an error string or a log line.

use std::error::Error as _;
use url::Url;

/// Drop credentials from a URL before it is logged.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.to_string()
}

/// `reqwest` error text without the request URL, followed by its cause chain, e.g.
/// `error sending request: client error (Connect): tcp connect error: Connection refused`.
///
/// The URL names the domain and user being looked up, so it stays in log fields only.
#[must_use]
pub fn describe_reqwest_error(e: reqwest::Error) -> String {
    let e = e.without_url();
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !msg.ends_with(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}
