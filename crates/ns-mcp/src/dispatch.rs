//! Tool dispatch: validate arguments, call the gateway, shape the reply.
//!
//! Two failure classes are kept apart on purpose:
//! - malformed invocations (unknown tool, missing or unusable arguments) are protocol errors
//!   (`ErrorData`) and never reach the gateway;
//! - remote failures come back from the gateway as `success: false` envelopes and are delivered
//!   as ordinary tool results.

use crate::catalog::{Operation, build_catalog, required_params};
use rmcp::model::{CallToolResult, Content, ErrorCode, ErrorData, JsonObject, Tool};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use unrelated_ns_api::params::{
    AgentStatisticsQuery, AnswerRuleRef, CdrQuery, DomainListQuery, DomainRef,
    PhoneNumberListQuery, PhoneNumberRef, QueueAgentRef, QueueRef, SearchUsersParams, UserRef,
};
use unrelated_ns_api::{NsApiClient, OperationResult};

/// Routes tool calls to the NetSapiens gateway.
///
/// Holds the immutable catalog and one gateway; safe to share behind an `Arc`.
pub struct Dispatcher {
    gateway: NsApiClient,
    tools: Vec<Tool>,
}

/// JSON body of every tool reply.
#[derive(Debug, Serialize)]
struct ToolReply<T> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(gateway: NsApiClient) -> Self {
        Self {
            gateway,
            tools: build_catalog(),
        }
    }

    /// The tool catalog. Same content and order on every call.
    #[must_use]
    pub fn list_tools(&self) -> &[Tool] {
        &self.tools
    }

    #[must_use]
    pub fn gateway(&self) -> &NsApiClient {
        &self.gateway
    }

    /// Execute one tool call.
    ///
    /// # Errors
    ///
    /// Returns `METHOD_NOT_FOUND` for an unknown tool name and `INVALID_PARAMS` when a required
    /// argument is missing or falsy, or when an argument has an unusable type. In both cases no
    /// HTTP request is made. Remote API failures are **not** errors: they come back as a
    /// successful result whose JSON body has `"success": false`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        let Some(op) = Operation::from_name(name) else {
            return Err(ErrorData::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Unknown tool: {name}"),
                None,
            ));
        };
        let tool = self
            .tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| {
                ErrorData::internal_error(format!("tool '{name}' missing from catalog"), None)
            })?;

        let args = arguments.unwrap_or_default();
        check_required(tool, &args)?;

        debug!(tool = name, "dispatching tool call");
        self.invoke(op, args).await
    }

    #[allow(clippy::too_many_lines)]
    async fn invoke(&self, op: Operation, args: JsonObject) -> Result<CallToolResult, ErrorData> {
        let gw = &self.gateway;
        match op {
            Operation::SearchUsers => {
                let p: SearchUsersParams = parse_args(op, args)?;
                let r = gw.search_users(&p).await;
                let msg = describe(&r, "Failed to search users", || {
                    format!("Found {} users matching \"{}\"", r.len(), p.query)
                });
                reply(r, msg)
            }
            Operation::GetUser => {
                let p: UserRef = parse_args(op, args)?;
                let r = gw.get_user(&p).await;
                let msg = describe(&r, "Failed to get user", || {
                    format!("Retrieved user details for {}", p.user_id)
                });
                reply(r, msg)
            }
            Operation::GetCdrRecords => {
                let q: CdrQuery = parse_args(op, args)?;
                let r = gw.get_cdr_records(&q).await;
                let msg = describe(&r, "Failed to get CDR records", || {
                    format!("Retrieved {} CDR records", r.len())
                });
                reply(r, msg)
            }
            Operation::GetDomains => {
                let q: DomainListQuery = parse_args(op, args)?;
                let r = gw.get_domains(&q).await;
                let msg = describe(&r, "Failed to get domains", || {
                    format!("Retrieved {} domains", r.len())
                });
                reply(r, msg)
            }
            Operation::GetDomain => {
                let p: DomainRef = parse_args(op, args)?;
                let r = gw.get_domain(&p).await;
                let msg = describe(&r, "Failed to get domain", || {
                    format!("Retrieved domain details for {}", p.domain)
                });
                reply(r, msg)
            }
            Operation::GetUserDevices => {
                let p: UserRef = parse_args(op, args)?;
                let r = gw.get_user_devices(&p).await;
                let msg = describe(&r, "Failed to get user devices", || {
                    format!(
                        "Retrieved {} devices for user {}@{}",
                        r.len(),
                        p.user_id,
                        p.domain
                    )
                });
                reply(r, msg)
            }
            Operation::GetPhoneNumbers => {
                let q: PhoneNumberListQuery = parse_args(op, args)?;
                let r = gw.get_phone_numbers(&q).await;
                let msg = describe(&r, "Failed to get phone numbers", || {
                    format!(
                        "Retrieved {} phone numbers for domain {}",
                        r.len(),
                        q.domain
                    )
                });
                reply(r, msg)
            }
            Operation::GetPhoneNumber => {
                let p: PhoneNumberRef = parse_args(op, args)?;
                let r = gw.get_phone_number(&p).await;
                let msg = describe(&r, "Failed to get phone number", || {
                    format!("Retrieved phone number {} in domain {}", p.phone_number, p.domain)
                });
                reply(r, msg)
            }
            Operation::GetCallQueues => {
                let p: DomainRef = parse_args(op, args)?;
                let r = gw.get_call_queues(&p).await;
                let msg = describe(&r, "Failed to get call queues", || {
                    format!("Retrieved {} call queues for domain {}", r.len(), p.domain)
                });
                reply(r, msg)
            }
            Operation::GetCallQueue => {
                let p: QueueRef = parse_args(op, args)?;
                let r = gw.get_call_queue(&p).await;
                let msg = describe(&r, "Failed to get call queue", || {
                    format!("Retrieved call queue {} in domain {}", p.queue_id, p.domain)
                });
                reply(r, msg)
            }
            Operation::GetCallQueueAgents => {
                let p: QueueRef = parse_args(op, args)?;
                let r = gw.get_call_queue_agents(&p).await;
                let msg = describe(&r, "Failed to get call queue agents", || {
                    format!("Retrieved {} agents for call queue {}", r.len(), p.queue_id)
                });
                reply(r, msg)
            }
            Operation::GetAgents => {
                let p: DomainRef = parse_args(op, args)?;
                let r = gw.get_agents(&p).await;
                let msg = describe(&r, "Failed to get agents", || {
                    format!("Retrieved {} agents for domain {}", r.len(), p.domain)
                });
                reply(r, msg)
            }
            Operation::LoginAgent => {
                let p: QueueAgentRef = parse_args(op, args)?;
                let r = gw.login_agent(&p).await;
                let msg = describe(&r, "Failed to login agent", || {
                    format!("Agent {} logged into queue {}", p.agent_id, p.queue_id)
                });
                reply(r, msg)
            }
            Operation::LogoutAgent => {
                let p: QueueAgentRef = parse_args(op, args)?;
                let r = gw.logout_agent(&p).await;
                let msg = describe(&r, "Failed to logout agent", || {
                    format!("Agent {} logged out of queue {}", p.agent_id, p.queue_id)
                });
                reply(r, msg)
            }
            Operation::GetAutoAttendants => {
                let p: DomainRef = parse_args(op, args)?;
                let r = gw.get_auto_attendants(&p).await;
                let msg = describe(&r, "Failed to get auto attendants", || {
                    format!(
                        "Retrieved {} auto attendants for domain {}",
                        r.len(),
                        p.domain
                    )
                });
                reply(r, msg)
            }
            Operation::GetUserAnswerRules => {
                let p: UserRef = parse_args(op, args)?;
                let r = gw.get_user_answer_rules(&p).await;
                let msg = describe(&r, "Failed to get user answer rules", || {
                    format!(
                        "Retrieved {} answer rules for user {}@{}",
                        r.len(),
                        p.user_id,
                        p.domain
                    )
                });
                reply(r, msg)
            }
            Operation::GetUserAnswerRule => {
                let p: AnswerRuleRef = parse_args(op, args)?;
                let r = gw.get_user_answer_rule(&p).await;
                let msg = describe(&r, "Failed to get user answer rule", || {
                    format!(
                        "Retrieved answer rule {} for user {}@{}",
                        p.timeframe, p.user_id, p.domain
                    )
                });
                reply(r, msg)
            }
            Operation::GetUserGreetings => {
                let p: UserRef = parse_args(op, args)?;
                let r = gw.get_user_greetings(&p).await;
                let msg = describe(&r, "Failed to get user greetings", || {
                    format!(
                        "Retrieved {} greetings for user {}@{}",
                        r.len(),
                        p.user_id,
                        p.domain
                    )
                });
                reply(r, msg)
            }
            Operation::GetUserVoicemails => {
                let p: UserRef = parse_args(op, args)?;
                let r = gw.get_user_voicemails(&p).await;
                let msg = describe(&r, "Failed to get user voicemails", || {
                    format!(
                        "Retrieved {} voicemails for user {}@{}",
                        r.len(),
                        p.user_id,
                        p.domain
                    )
                });
                reply(r, msg)
            }
            Operation::GetMusicOnHold => {
                let p: DomainRef = parse_args(op, args)?;
                let r = gw.get_music_on_hold(&p).await;
                let msg = describe(&r, "Failed to get music on hold", || {
                    format!(
                        "Retrieved {} music on hold entries for domain {}",
                        r.len(),
                        p.domain
                    )
                });
                reply(r, msg)
            }
            Operation::GetBilling => {
                let p: DomainRef = parse_args(op, args)?;
                let r = gw.get_billing(&p).await;
                let msg = describe(&r, "Failed to get billing information", || {
                    format!("Retrieved billing information for domain {}", p.domain)
                });
                reply(r, msg)
            }
            Operation::GetAgentStatistics => {
                let q: AgentStatisticsQuery = parse_args(op, args)?;
                let r = gw.get_agent_statistics(&q).await;
                let msg = describe(&r, "Failed to get agent statistics", || match &q.agent_id {
                    Some(agent) => format!("Retrieved statistics for agent {agent}"),
                    None => format!("Retrieved agent statistics for domain {}", q.domain),
                });
                reply(r, msg)
            }
            Operation::TestConnection => {
                let r = gw.test_connection().await;
                let msg = describe(&r, "Connection to NetSapiens API failed", || {
                    "Connected to NetSapiens API".to_string()
                });
                reply(r, msg)
            }
        }
    }
}

/// Reject the call if any required argument is absent or falsy (`null`, `""`, `0`, `false`).
fn check_required(tool: &Tool, args: &JsonObject) -> Result<(), ErrorData> {
    let missing: Vec<&str> = required_params(tool)
        .into_iter()
        .filter(|name| args.get(*name).is_none_or(is_falsy))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(ErrorData::invalid_params(
        format!("Missing required parameters: {}", missing.join(", ")),
        Some(json!({ "tool": tool.name, "missing": missing })),
    ))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn parse_args<P: DeserializeOwned>(op: Operation, args: JsonObject) -> Result<P, ErrorData> {
    serde_json::from_value(Value::Object(args)).map_err(|e| {
        ErrorData::invalid_params(format!("Invalid parameters for {}: {e}", op.name()), None)
    })
}

/// Reply message: the gateway's own message when it set one, else the operation's sentence.
fn describe<T>(
    result: &OperationResult<T>,
    failure: &str,
    success: impl FnOnce() -> String,
) -> String {
    if result.success {
        result.message.clone().unwrap_or_else(success)
    } else {
        format!("{failure}: {}", result.error_text())
    }
}

fn reply<T: Serialize>(
    result: OperationResult<T>,
    message: String,
) -> Result<CallToolResult, ErrorData> {
    let body = ToolReply {
        success: result.success,
        message,
        data: result.data,
        error: result.error,
    };
    let text = serde_json::to_string_pretty(&body).map_err(|e| {
        ErrorData::internal_error(format!("failed to serialize tool reply: {e}"), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}
