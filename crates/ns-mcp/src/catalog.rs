//! The fixed tool catalog.
//!
//! One [`Operation`] per NetSapiens call, each described by an MCP `Tool` whose input schema
//! lists its parameters, defaults, and the `required` subset. The catalog is built once and the
//! order below is the order clients see.

use crate::semantics::annotations_for_method;
use rmcp::model::{JsonObject, Tool};
use serde_json::{Value, json};
use std::sync::Arc;
use unrelated_ns_api::Method;
use unrelated_ns_api::params::{CDR_DEFAULT_LIMIT, SEARCH_USERS_DEFAULT_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SearchUsers,
    GetUser,
    GetCdrRecords,
    GetDomains,
    GetDomain,
    GetUserDevices,
    GetPhoneNumbers,
    GetPhoneNumber,
    GetCallQueues,
    GetCallQueue,
    GetCallQueueAgents,
    GetAgents,
    LoginAgent,
    LogoutAgent,
    GetAutoAttendants,
    GetUserAnswerRules,
    GetUserAnswerRule,
    GetUserGreetings,
    GetUserVoicemails,
    GetMusicOnHold,
    GetBilling,
    GetAgentStatistics,
    TestConnection,
}

impl Operation {
    pub const ALL: [Operation; 23] = [
        Operation::SearchUsers,
        Operation::GetUser,
        Operation::GetCdrRecords,
        Operation::GetDomains,
        Operation::GetDomain,
        Operation::GetUserDevices,
        Operation::GetPhoneNumbers,
        Operation::GetPhoneNumber,
        Operation::GetCallQueues,
        Operation::GetCallQueue,
        Operation::GetCallQueueAgents,
        Operation::GetAgents,
        Operation::LoginAgent,
        Operation::LogoutAgent,
        Operation::GetAutoAttendants,
        Operation::GetUserAnswerRules,
        Operation::GetUserAnswerRule,
        Operation::GetUserGreetings,
        Operation::GetUserVoicemails,
        Operation::GetMusicOnHold,
        Operation::GetBilling,
        Operation::GetAgentStatistics,
        Operation::TestConnection,
    ];

    /// Stable tool name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::SearchUsers => "search_users",
            Operation::GetUser => "get_user",
            Operation::GetCdrRecords => "get_cdr_records",
            Operation::GetDomains => "get_domains",
            Operation::GetDomain => "get_domain",
            Operation::GetUserDevices => "get_user_devices",
            Operation::GetPhoneNumbers => "get_phone_numbers",
            Operation::GetPhoneNumber => "get_phone_number",
            Operation::GetCallQueues => "get_call_queues",
            Operation::GetCallQueue => "get_call_queue",
            Operation::GetCallQueueAgents => "get_call_queue_agents",
            Operation::GetAgents => "get_agents",
            Operation::LoginAgent => "login_agent",
            Operation::LogoutAgent => "logout_agent",
            Operation::GetAutoAttendants => "get_auto_attendants",
            Operation::GetUserAnswerRules => "get_user_answer_rules",
            Operation::GetUserAnswerRule => "get_user_answer_rule",
            Operation::GetUserGreetings => "get_user_greetings",
            Operation::GetUserVoicemails => "get_user_voicemails",
            Operation::GetMusicOnHold => "get_music_on_hold",
            Operation::GetBilling => "get_billing",
            Operation::GetAgentStatistics => "get_agent_statistics",
            Operation::TestConnection => "test_connection",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// HTTP method of the underlying call.
    #[must_use]
    pub fn http_method(self) -> Method {
        match self {
            Operation::LoginAgent | Operation::LogoutAgent => Method::POST,
            _ => Method::GET,
        }
    }

    fn description(self) -> &'static str {
        match self {
            Operation::SearchUsers => {
                "Search NetSapiens users by name, extension or email, within one domain or across all domains"
            }
            Operation::GetUser => "Get details for a specific user",
            Operation::GetCdrRecords => {
                "Get call detail records, optionally narrowed to a domain, a user, and a date range"
            }
            Operation::GetDomains => "List all domains",
            Operation::GetDomain => "Get details for a specific domain",
            Operation::GetUserDevices => "List the devices registered to a user",
            Operation::GetPhoneNumbers => "List the phone numbers (DIDs) of a domain",
            Operation::GetPhoneNumber => "Get details for a specific phone number",
            Operation::GetCallQueues => "List the call queues of a domain",
            Operation::GetCallQueue => "Get details for a specific call queue",
            Operation::GetCallQueueAgents => "List the agents assigned to a call queue",
            Operation::GetAgents => "List the call center agents of a domain",
            Operation::LoginAgent => "Log an agent into a call queue",
            Operation::LogoutAgent => "Log an agent out of a call queue",
            Operation::GetAutoAttendants => "List the auto attendants of a domain",
            Operation::GetUserAnswerRules => "List a user's answer rules",
            Operation::GetUserAnswerRule => "Get a user's answer rule for one timeframe",
            Operation::GetUserGreetings => "List a user's voicemail greetings",
            Operation::GetUserVoicemails => "List a user's voicemail messages",
            Operation::GetMusicOnHold => "List the music on hold entries of a domain",
            Operation::GetBilling => "Get billing information for a domain",
            Operation::GetAgentStatistics => {
                "Get call center statistics for a domain, or for one agent when agentId is given"
            }
            Operation::TestConnection => {
                "Check that the NetSapiens API is reachable with the configured token"
            }
        }
    }

    fn params(self) -> Vec<ParamSpec> {
        const DOMAIN: ParamSpec = ParamSpec::string("domain", "Domain name (e.g. example.com)");
        const USER_ID: ParamSpec = ParamSpec::string("userId", "User ID or extension");
        const QUEUE_ID: ParamSpec = ParamSpec::string("queueId", "Call queue ID");
        const AGENT_ID: ParamSpec = ParamSpec::string("agentId", "Agent ID or extension");
        const START_DATE: ParamSpec =
            ParamSpec::string("startDate", "Start of the date range (YYYY-MM-DD)");
        const END_DATE: ParamSpec =
            ParamSpec::string("endDate", "End of the date range (YYYY-MM-DD)");

        match self {
            Operation::SearchUsers => vec![
                ParamSpec::string("query", "Search text (name, extension or email)").required(),
                ParamSpec::string("domain", "Limit the search to one domain"),
                ParamSpec::integer("limit", "Maximum number of results")
                    .default_to(SEARCH_USERS_DEFAULT_LIMIT),
            ],
            Operation::GetUser
            | Operation::GetUserDevices
            | Operation::GetUserAnswerRules
            | Operation::GetUserGreetings
            | Operation::GetUserVoicemails => vec![USER_ID.required(), DOMAIN.required()],
            Operation::GetCdrRecords => vec![
                ParamSpec::string("domain", "Limit records to one domain"),
                ParamSpec::string("user", "Limit records to one user"),
                START_DATE,
                END_DATE,
                ParamSpec::integer("limit", "Maximum number of records")
                    .default_to(CDR_DEFAULT_LIMIT),
            ],
            Operation::GetDomains => {
                vec![ParamSpec::integer("limit", "Maximum number of domains")]
            }
            Operation::GetDomain
            | Operation::GetCallQueues
            | Operation::GetAgents
            | Operation::GetAutoAttendants
            | Operation::GetMusicOnHold
            | Operation::GetBilling => vec![DOMAIN.required()],
            Operation::GetPhoneNumbers => vec![
                DOMAIN.required(),
                ParamSpec::integer("limit", "Maximum number of phone numbers"),
            ],
            Operation::GetPhoneNumber => vec![
                DOMAIN.required(),
                ParamSpec::string("phoneNumber", "Phone number (e.g. 15551234567)").required(),
            ],
            Operation::GetCallQueue | Operation::GetCallQueueAgents => {
                vec![DOMAIN.required(), QUEUE_ID.required()]
            }
            Operation::LoginAgent | Operation::LogoutAgent => vec![
                DOMAIN.required(),
                QUEUE_ID.required(),
                AGENT_ID.required(),
            ],
            Operation::GetUserAnswerRule => vec![
                USER_ID.required(),
                DOMAIN.required(),
                ParamSpec::string("timeframe", "Answer rule timeframe name").required(),
            ],
            Operation::GetAgentStatistics => vec![
                DOMAIN.required(),
                ParamSpec::string("agentId", "Limit statistics to one agent"),
                START_DATE,
                END_DATE,
            ],
            Operation::TestConnection => Vec::new(),
        }
    }

    /// The MCP tool advertised for this operation.
    #[must_use]
    pub fn tool(self) -> Tool {
        let mut tool = Tool::new(
            self.name(),
            self.description(),
            Arc::new(build_input_schema(&self.params())),
        );
        tool.annotations = Some(annotations_for_method(&self.http_method()));
        tool
    }
}

#[derive(Debug, Clone, Copy)]
struct ParamSpec {
    name: &'static str,
    schema_type: &'static str,
    description: &'static str,
    required: bool,
    default: Option<u32>,
}

impl ParamSpec {
    const fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            schema_type: "string",
            description,
            required: false,
            default: None,
        }
    }

    const fn integer(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            schema_type: "integer",
            description,
            required: false,
            default: None,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn default_to(mut self, value: u32) -> Self {
        self.default = Some(value);
        self
    }
}

fn build_input_schema(params: &[ParamSpec]) -> JsonObject {
    let mut properties = JsonObject::new();
    let mut required: Vec<&str> = Vec::new();

    for p in params {
        let mut prop = json!({
            "type": p.schema_type,
            "description": p.description,
        });
        if p.schema_type == "integer" {
            prop["minimum"] = json!(1);
        }
        if let Some(default) = p.default {
            prop["default"] = json!(default);
        }
        properties.insert(p.name.to_string(), prop);
        if p.required {
            required.push(p.name);
        }
    }

    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }
    schema
}

/// Names listed under `required` in a tool's input schema.
#[must_use]
pub fn required_params(tool: &Tool) -> Vec<&str> {
    tool.input_schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect()
}

/// The full catalog, in advertised order.
#[must_use]
pub fn build_catalog() -> Vec<Tool> {
    Operation::ALL.into_iter().map(Operation::tool).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for op in Operation::ALL {
            assert!(seen.insert(op.name()), "duplicate name {}", op.name());
            assert_eq!(Operation::from_name(op.name()), Some(op));
        }
        assert_eq!(seen.len(), 23);
        assert_eq!(Operation::from_name("get_everything"), None);
    }

    #[test]
    fn defaults_are_advertised() {
        let tool = Operation::SearchUsers.tool();
        assert_eq!(tool.input_schema["properties"]["limit"]["default"], json!(20));

        let tool = Operation::GetCdrRecords.tool();
        assert_eq!(tool.input_schema["properties"]["limit"]["default"], json!(100));
        assert!(required_params(&tool).is_empty());
        assert!(tool.input_schema.get("required").is_none());
    }

    #[test]
    fn only_agent_state_changes_are_not_read_only() {
        for op in Operation::ALL {
            let tool = op.tool();
            let read_only = tool.annotations.and_then(|a| a.read_only_hint);
            let expected = !matches!(op, Operation::LoginAgent | Operation::LogoutAgent);
            assert_eq!(read_only, Some(expected), "{}", op.name());
        }
    }
}
