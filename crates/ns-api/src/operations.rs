//! One method per NetSapiens operation.
//!
//! Each method maps its typed parameters onto exactly one request and never returns `Err`.
//! List operations yield an empty list on failure; single-entity operations yield no data.

use crate::client::{ApiRequest, NsApiClient};
use crate::envelope::{ConnectionStatus, OperationResult};
use crate::params::{
    AgentStatisticsQuery, AnswerRuleRef, CdrQuery, DomainListQuery, DomainRef,
    PhoneNumberListQuery, PhoneNumberRef, QueueAgentRef, QueueRef, SearchUsersParams, UserRef,
};
use serde_json::Value;

impl NsApiClient {
    /// Search users in one domain, or across all domains when `domain` is omitted.
    pub async fn search_users(&self, p: &SearchUsersParams) -> OperationResult<Vec<Value>> {
        let req = match p.domain.as_deref() {
            Some(domain) => ApiRequest::get(&["domains", domain, "users"]),
            None => ApiRequest::get(&["users"]),
        }
        .query("search", p.query.as_str())
        .query("limit", p.limit());
        self.fetch_list("search_users", "Failed to search users", req)
            .await
    }

    pub async fn get_user(&self, p: &UserRef) -> OperationResult<Value> {
        let req = ApiRequest::get(&["domains", p.domain.as_str(), "users", p.user_id.as_str()]);
        self.fetch_one("get_user", "Failed to get user", req).await
    }

    /// Call detail records, narrowed by domain and user when given.
    ///
    /// A user without a domain cannot be addressed by path, so it is sent as a `user` filter on
    /// the global listing instead.
    pub async fn get_cdr_records(&self, q: &CdrQuery) -> OperationResult<Vec<Value>> {
        let req = match (q.domain.as_deref(), q.user.as_deref()) {
            (Some(domain), Some(user)) => {
                ApiRequest::get(&["domains", domain, "users", user, "cdrs"])
            }
            (Some(domain), None) => ApiRequest::get(&["domains", domain, "cdrs"]),
            (None, user) => ApiRequest::get(&["cdrs"]).query_opt("user", user),
        }
        .query_opt("start_time", q.start_date.as_deref())
        .query_opt("end_time", q.end_date.as_deref())
        .query("limit", q.limit());
        self.fetch_list("get_cdr_records", "Failed to get CDR records", req)
            .await
    }

    pub async fn get_domains(&self, q: &DomainListQuery) -> OperationResult<Vec<Value>> {
        let mut req = ApiRequest::get(&["domains"]);
        if let Some(limit) = q.limit {
            req = req.query("limit", limit);
        }
        self.fetch_list("get_domains", "Failed to get domains", req)
            .await
    }

    pub async fn get_domain(&self, p: &DomainRef) -> OperationResult<Value> {
        let req = ApiRequest::get(&["domains", p.domain.as_str()]);
        self.fetch_one("get_domain", "Failed to get domain", req)
            .await
    }

    pub async fn get_user_devices(&self, p: &UserRef) -> OperationResult<Vec<Value>> {
        let req = ApiRequest::get(&[
            "domains",
            p.domain.as_str(),
            "users",
            p.user_id.as_str(),
            "devices",
        ]);
        self.fetch_list("get_user_devices", "Failed to get user devices", req)
            .await
    }

    pub async fn get_phone_numbers(&self, q: &PhoneNumberListQuery) -> OperationResult<Vec<Value>> {
        let mut req = ApiRequest::get(&["domains", q.domain.as_str(), "phonenumbers"]);
        if let Some(limit) = q.limit {
            req = req.query("limit", limit);
        }
        self.fetch_list("get_phone_numbers", "Failed to get phone numbers", req)
            .await
    }

    pub async fn get_phone_number(&self, p: &PhoneNumberRef) -> OperationResult<Value> {
        let req = ApiRequest::get(&[
            "domains",
            p.domain.as_str(),
            "phonenumbers",
            p.phone_number.as_str(),
        ]);
        self.fetch_one("get_phone_number", "Failed to get phone number", req)
            .await
    }

    pub async fn get_call_queues(&self, p: &DomainRef) -> OperationResult<Vec<Value>> {
        let req = ApiRequest::get(&["domains", p.domain.as_str(), "callqueues"]);
        self.fetch_list("get_call_queues", "Failed to get call queues", req)
            .await
    }

    pub async fn get_call_queue(&self, p: &QueueRef) -> OperationResult<Value> {
        let req = ApiRequest::get(&[
            "domains",
            p.domain.as_str(),
            "callqueues",
            p.queue_id.as_str(),
        ]);
        self.fetch_one("get_call_queue", "Failed to get call queue", req)
            .await
    }

    pub async fn get_call_queue_agents(&self, p: &QueueRef) -> OperationResult<Vec<Value>> {
        let req = ApiRequest::get(&[
            "domains",
            p.domain.as_str(),
            "callqueues",
            p.queue_id.as_str(),
            "agents",
        ]);
        self.fetch_list(
            "get_call_queue_agents",
            "Failed to get call queue agents",
            req,
        )
        .await
    }

    pub async fn get_agents(&self, p: &DomainRef) -> OperationResult<Vec<Value>> {
        let req = ApiRequest::get(&["domains", p.domain.as_str(), "agents"]);
        self.fetch_list("get_agents", "Failed to get agents", req)
            .await
    }

    /// Log an agent into a call queue (state-changing, POST without body).
    pub async fn login_agent(&self, p: &QueueAgentRef) -> OperationResult<Value> {
        let req = ApiRequest::post(&[
            "domains",
            p.domain.as_str(),
            "callqueues",
            p.queue_id.as_str(),
            "agents",
            p.agent_id.as_str(),
            "login",
        ]);
        self.fetch_one("login_agent", "Failed to login agent", req)
            .await
    }

    /// Log an agent out of a call queue (state-changing, POST without body).
    pub async fn logout_agent(&self, p: &QueueAgentRef) -> OperationResult<Value> {
        let req = ApiRequest::post(&[
            "domains",
            p.domain.as_str(),
            "callqueues",
            p.queue_id.as_str(),
            "agents",
            p.agent_id.as_str(),
            "logout",
        ]);
        self.fetch_one("logout_agent", "Failed to logout agent", req)
            .await
    }

    pub async fn get_auto_attendants(&self, p: &DomainRef) -> OperationResult<Vec<Value>> {
        let req = ApiRequest::get(&["domains", p.domain.as_str(), "autoattendants"]);
        self.fetch_list("get_auto_attendants", "Failed to get auto attendants", req)
            .await
    }

    pub async fn get_user_answer_rules(&self, p: &UserRef) -> OperationResult<Vec<Value>> {
        let req = ApiRequest::get(&[
            "domains",
            p.domain.as_str(),
            "users",
            p.user_id.as_str(),
            "answerrules",
        ]);
        self.fetch_list(
            "get_user_answer_rules",
            "Failed to get user answer rules",
            req,
        )
        .await
    }

    pub async fn get_user_answer_rule(&self, p: &AnswerRuleRef) -> OperationResult<Value> {
        let req = ApiRequest::get(&[
            "domains",
            p.domain.as_str(),
            "users",
            p.user_id.as_str(),
            "answerrules",
            p.timeframe.as_str(),
        ]);
        self.fetch_one(
            "get_user_answer_rule",
            "Failed to get user answer rule",
            req,
        )
        .await
    }

    pub async fn get_user_greetings(&self, p: &UserRef) -> OperationResult<Vec<Value>> {
        let req = ApiRequest::get(&[
            "domains",
            p.domain.as_str(),
            "users",
            p.user_id.as_str(),
            "greetings",
        ]);
        self.fetch_list("get_user_greetings", "Failed to get user greetings", req)
            .await
    }

    pub async fn get_user_voicemails(&self, p: &UserRef) -> OperationResult<Vec<Value>> {
        let req = ApiRequest::get(&[
            "domains",
            p.domain.as_str(),
            "users",
            p.user_id.as_str(),
            "voicemails",
        ]);
        self.fetch_list("get_user_voicemails", "Failed to get user voicemails", req)
            .await
    }

    pub async fn get_music_on_hold(&self, p: &DomainRef) -> OperationResult<Vec<Value>> {
        let req = ApiRequest::get(&["domains", p.domain.as_str(), "moh"]);
        self.fetch_list("get_music_on_hold", "Failed to get music on hold", req)
            .await
    }

    pub async fn get_billing(&self, p: &DomainRef) -> OperationResult<Value> {
        let req = ApiRequest::get(&["domains", p.domain.as_str(), "billing"]);
        self.fetch_one("get_billing", "Failed to get billing information", req)
            .await
    }

    /// Statistics for one agent, or every agent of the domain when `agent_id` is omitted.
    pub async fn get_agent_statistics(&self, q: &AgentStatisticsQuery) -> OperationResult<Value> {
        let req = match q.agent_id.as_deref() {
            Some(agent) => {
                ApiRequest::get(&["domains", q.domain.as_str(), "agents", agent, "statistics"])
            }
            None => ApiRequest::get(&["domains", q.domain.as_str(), "agents", "statistics"]),
        }
        .query_opt("start_time", q.start_date.as_deref())
        .query_opt("end_time", q.end_date.as_deref());
        self.fetch_one(
            "get_agent_statistics",
            "Failed to get agent statistics",
            req,
        )
        .await
    }

    /// Reachability check: list at most one domain.
    ///
    /// Only whether the API answered with 2xx matters; an empty domain list still counts as
    /// connected.
    pub async fn test_connection(&self) -> OperationResult<ConnectionStatus> {
        let query = DomainListQuery { limit: Some(1) };
        let listed = self.get_domains(&query).await;
        if listed.success {
            OperationResult::ok(ConnectionStatus { connected: true })
                .with_message("Connection to NetSapiens API successful")
        } else {
            OperationResult::failed(
                listed
                    .error
                    .unwrap_or_else(|| "Failed to connect to NetSapiens API".to_string()),
                Some(ConnectionStatus { connected: false }),
            )
        }
    }
}
