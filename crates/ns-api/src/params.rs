//! Typed parameters for each gateway operation.
//!
//! These deserialize straight from a tool-call argument object (camelCase keys). Identifier
//! fields accept either JSON strings or numbers; `limit` accepts numbers or numeric strings.
//! Empty strings in optional fields count as "not provided".

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const SEARCH_USERS_DEFAULT_LIMIT: u32 = 20;
pub const CDR_DEFAULT_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsersParams {
    #[serde(deserialize_with = "string_like")]
    pub query: String,
    /// Search a single domain; omitted means the cross-domain endpoint.
    #[serde(default, deserialize_with = "opt_string_like")]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "opt_limit")]
    pub limit: Option<u32>,
}

impl SearchUsersParams {
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(SEARCH_USERS_DEFAULT_LIMIT)
    }
}

/// A user inside a domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(deserialize_with = "string_like")]
    pub user_id: String,
    #[serde(deserialize_with = "string_like")]
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdrQuery {
    #[serde(default, deserialize_with = "opt_string_like")]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "opt_string_like")]
    pub user: Option<String>,
    /// Sent as `start_time`.
    #[serde(default, deserialize_with = "opt_string_like")]
    pub start_date: Option<String>,
    /// Sent as `end_time`.
    #[serde(default, deserialize_with = "opt_string_like")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "opt_limit")]
    pub limit: Option<u32>,
}

impl CdrQuery {
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(CDR_DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainListQuery {
    #[serde(default, deserialize_with = "opt_limit")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRef {
    #[serde(deserialize_with = "string_like")]
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumberListQuery {
    #[serde(deserialize_with = "string_like")]
    pub domain: String,
    #[serde(default, deserialize_with = "opt_limit")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumberRef {
    #[serde(deserialize_with = "string_like")]
    pub domain: String,
    #[serde(deserialize_with = "string_like")]
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRef {
    #[serde(deserialize_with = "string_like")]
    pub domain: String,
    #[serde(deserialize_with = "string_like")]
    pub queue_id: String,
}

/// An agent inside a call queue (login/logout target).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueAgentRef {
    #[serde(deserialize_with = "string_like")]
    pub domain: String,
    #[serde(deserialize_with = "string_like")]
    pub queue_id: String,
    #[serde(deserialize_with = "string_like")]
    pub agent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRuleRef {
    #[serde(deserialize_with = "string_like")]
    pub user_id: String,
    #[serde(deserialize_with = "string_like")]
    pub domain: String,
    #[serde(deserialize_with = "string_like")]
    pub timeframe: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatisticsQuery {
    #[serde(deserialize_with = "string_like")]
    pub domain: String,
    /// Narrow to one agent; omitted means domain-wide statistics.
    #[serde(default, deserialize_with = "opt_string_like")]
    pub agent_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_like")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "opt_string_like")]
    pub end_date: Option<String>,
}

fn string_like<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn opt_string_like<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn opt_limit<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed
        .filter(|limit| *limit > 0)
        .map(Some)
        .ok_or_else(|| D::Error::custom("limit must be a positive integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_users_applies_default_limit() {
        let p: SearchUsersParams =
            serde_json::from_value(json!({ "query": "john" })).expect("valid");
        assert_eq!(p.query, "john");
        assert_eq!(p.domain, None);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn limit_accepts_numeric_strings() {
        let p: SearchUsersParams =
            serde_json::from_value(json!({ "query": "john", "limit": "5" })).expect("valid");
        assert_eq!(p.limit(), 5);

        let bad = serde_json::from_value::<SearchUsersParams>(json!({
            "query": "john",
            "limit": "lots"
        }));
        assert!(bad.is_err());

        let negative = serde_json::from_value::<SearchUsersParams>(json!({
            "query": "john",
            "limit": -1
        }));
        assert!(negative.is_err());
    }

    #[test]
    fn zero_limit_is_rejected() {
        for limit in [json!(0), json!("0")] {
            let r = serde_json::from_value::<DomainListQuery>(json!({ "limit": limit }));
            assert!(r.is_err(), "limit {limit} accepted");
        }
        let q: DomainListQuery = serde_json::from_value(json!({ "limit": 1 })).expect("valid");
        assert_eq!(q.limit, Some(1));
    }

    #[test]
    fn identifiers_accept_numbers() {
        let p: QueueAgentRef = serde_json::from_value(json!({
            "domain": "example.com",
            "queueId": 5001,
            "agentId": "1001"
        }))
        .expect("valid");
        assert_eq!(p.queue_id, "5001");
        assert_eq!(p.agent_id, "1001");
    }

    #[test]
    fn empty_optional_strings_are_absent() {
        let q: CdrQuery = serde_json::from_value(json!({
            "domain": "",
            "user": null,
            "startDate": "2024-01-01"
        }))
        .expect("valid");
        assert_eq!(q.domain, None);
        assert_eq!(q.user, None);
        assert_eq!(q.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(q.limit(), 100);
    }

    #[test]
    fn objects_are_rejected_for_identifiers() {
        let r = serde_json::from_value::<DomainRef>(json!({ "domain": { "x": 1 } }));
        assert!(r.is_err());
    }
}
