use serde_json::{Value, json};
use std::time::Duration;
use unrelated_ns_api::params::{
    AgentStatisticsQuery, AnswerRuleRef, CdrQuery, DomainListQuery, DomainRef,
    PhoneNumberListQuery, QueueAgentRef, SearchUsersParams, UserRef,
};
use unrelated_ns_api::{GatewayConfig, NsApiClient, RateLimitConfig};
use unrelated_test_support::{MockNsApi, MockResponse};

fn gateway(mock: &MockNsApi) -> NsApiClient {
    NsApiClient::new(
        GatewayConfig::new(mock.api_url(), "test-token").with_timeout(Duration::from_secs(5)),
    )
    .expect("gateway")
}

fn user(user_id: &str, domain: &str) -> UserRef {
    UserRef {
        user_id: user_id.to_string(),
        domain: domain.to_string(),
    }
}

fn domain(domain: &str) -> DomainRef {
    DomainRef {
        domain: domain.to_string(),
    }
}

#[tokio::test]
async fn requests_carry_auth_and_json_headers() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get(
        "/domains/example.com/users/alice",
        MockResponse::json(json!({ "user": "alice" })),
    );

    let result = gateway(&mock).get_user(&user("alice", "example.com")).await;
    assert!(result.success);

    let req = mock.only_request();
    assert_eq!(req.method, "GET");
    assert_eq!(req.header("authorization"), Some("Bearer test-token"));
    assert_eq!(req.header("accept"), Some("application/json"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert!(
        req.header("user-agent")
            .is_some_and(|ua| ua.starts_with("unrelated-ns-mcp/"))
    );
    Ok(())
}

#[tokio::test]
async fn search_users_uses_domain_scope_or_global_endpoint() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get("/users", MockResponse::json(json!([{ "user": "john" }])));
    mock.on_get(
        "/domains/example.com/users",
        MockResponse::json(json!([{ "user": "john" }, { "user": "johnny" }])),
    );
    let gw = gateway(&mock);

    let global = gw
        .search_users(&SearchUsersParams {
            query: "john".to_string(),
            domain: None,
            limit: None,
        })
        .await;
    assert_eq!(global.len(), 1);

    let scoped = gw
        .search_users(&SearchUsersParams {
            query: "john".to_string(),
            domain: Some("example.com".to_string()),
            limit: Some(5),
        })
        .await;
    assert_eq!(scoped.len(), 2);

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/users");
    assert_eq!(requests[0].query_param("search").as_deref(), Some("john"));
    assert_eq!(requests[0].query_param("limit").as_deref(), Some("20"));
    assert_eq!(requests[1].path, "/domains/example.com/users");
    assert_eq!(requests[1].query_param("limit").as_deref(), Some("5"));
    Ok(())
}

#[tokio::test]
async fn cdr_scope_falls_back_to_global_listing() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get("/cdrs", MockResponse::json(json!([])));
    mock.on_get("/domains/example.com/cdrs", MockResponse::json(json!([])));
    mock.on_get(
        "/domains/example.com/users/alice/cdrs",
        MockResponse::json(json!([{ "id": 1 }])),
    );
    let gw = gateway(&mock);

    let r = gw.get_cdr_records(&CdrQuery::default()).await;
    assert!(r.success);

    gw.get_cdr_records(&CdrQuery {
        domain: Some("example.com".to_string()),
        start_date: Some("2024-01-01".to_string()),
        end_date: Some("2024-01-31".to_string()),
        ..CdrQuery::default()
    })
    .await;

    let r = gw
        .get_cdr_records(&CdrQuery {
            domain: Some("example.com".to_string()),
            user: Some("alice".to_string()),
            limit: Some(10),
            ..CdrQuery::default()
        })
        .await;
    assert_eq!(r.len(), 1);

    let requests = mock.requests();
    assert_eq!(requests[0].path, "/cdrs");
    assert_eq!(requests[0].query_param("limit").as_deref(), Some("100"));
    assert_eq!(requests[0].query_param("start_time"), None);

    assert_eq!(requests[1].path, "/domains/example.com/cdrs");
    assert_eq!(
        requests[1].query_param("start_time").as_deref(),
        Some("2024-01-01")
    );
    assert_eq!(
        requests[1].query_param("end_time").as_deref(),
        Some("2024-01-31")
    );

    assert_eq!(requests[2].path, "/domains/example.com/users/alice/cdrs");
    assert_eq!(requests[2].query_param("limit").as_deref(), Some("10"));
    Ok(())
}

#[tokio::test]
async fn bare_object_for_list_operation_is_wrapped() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get(
        "/domains/example.com/users/alice/devices",
        MockResponse::json(json!({ "device": "alice-desk" })),
    );

    let r = gateway(&mock)
        .get_user_devices(&user("alice", "example.com"))
        .await;
    assert!(r.success);
    assert_eq!(r.data, Some(vec![json!({ "device": "alice-desk" })]));
    Ok(())
}

#[tokio::test]
async fn http_failure_yields_empty_list_for_list_operations() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get(
        "/domains/example.com/callqueues",
        MockResponse::status(500, json!({ "message": "internal secret detail" })),
    );

    let r = gateway(&mock).get_call_queues(&domain("example.com")).await;
    assert!(!r.success);
    assert_eq!(r.data, Some(Vec::new()));
    assert_eq!(
        r.error.as_deref(),
        Some("Request failed with status code 500")
    );
    // Response bodies are logged, never returned.
    assert!(!r.error_text().contains("internal secret detail"));
    Ok(())
}

#[tokio::test]
async fn http_failure_yields_no_data_for_single_entity_operations() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;

    let r = gateway(&mock).get_billing(&domain("example.com")).await;
    assert!(!r.success);
    assert_eq!(r.data, None);
    assert_eq!(
        r.error.as_deref(),
        Some("Request failed with status code 404")
    );
    Ok(())
}

#[tokio::test]
async fn connection_failure_is_captured() {
    // Nothing listens on port 1.
    let gw = NsApiClient::new(
        GatewayConfig::new("http://127.0.0.1:1", "t").with_timeout(Duration::from_secs(2)),
    )
    .expect("gateway");

    let r = gw.get_domains(&DomainListQuery::default()).await;
    assert!(!r.success);
    assert_eq!(r.data, Some(Vec::new()));
    assert!(!r.error_text().is_empty());
}

#[tokio::test]
async fn transport_error_text_omits_the_request_url() {
    let gw = NsApiClient::new(
        GatewayConfig::new("http://127.0.0.1:1", "t").with_timeout(Duration::from_secs(2)),
    )
    .expect("gateway");

    let r = gw.get_user(&user("alice", "example.com")).await;
    assert!(!r.success);
    let error = r.error_text();
    assert!(
        error.starts_with("error sending request: "),
        "cause chain missing: {error}"
    );
    assert!(!error.contains("/ns-api/v2"), "{error}");
    assert!(!error.contains("example.com"), "{error}");
    assert!(!error.contains("127.0.0.1"), "{error}");
}

#[tokio::test]
async fn agent_login_and_logout_are_posts() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_post(
        "/domains/example.com/callqueues/sales/agents/1001/login",
        MockResponse::empty(202),
    );
    mock.on_post(
        "/domains/example.com/callqueues/sales/agents/1001/logout",
        MockResponse::json(json!({ "status": "offline" })),
    );
    let gw = gateway(&mock);
    let agent = QueueAgentRef {
        domain: "example.com".to_string(),
        queue_id: "sales".to_string(),
        agent_id: "1001".to_string(),
    };

    let login = gw.login_agent(&agent).await;
    assert!(login.success);
    assert_eq!(login.data, Some(Value::Null));

    let logout = gw.logout_agent(&agent).await;
    assert!(logout.success);
    assert_eq!(logout.data, Some(json!({ "status": "offline" })));

    assert!(mock.requests().iter().all(|r| r.method == "POST"));
    Ok(())
}

#[tokio::test]
async fn path_parameters_are_percent_encoded() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;

    gateway(&mock)
        .get_user_answer_rule(&AnswerRuleRef {
            user_id: "al/ice".to_string(),
            domain: "example.com".to_string(),
            timeframe: "after hours".to_string(),
        })
        .await;

    let req = mock.only_request();
    assert_eq!(
        req.path,
        "/domains/example.com/users/al%2Fice/answerrules/after%20hours"
    );
    Ok(())
}

#[tokio::test]
async fn agent_statistics_narrow_to_one_agent() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get(
        "/domains/example.com/agents/statistics",
        MockResponse::json(json!({ "agents": 4 })),
    );
    mock.on_get(
        "/domains/example.com/agents/1001/statistics",
        MockResponse::json(json!({ "calls": 12 })),
    );
    let gw = gateway(&mock);

    let all = gw
        .get_agent_statistics(&AgentStatisticsQuery {
            domain: "example.com".to_string(),
            agent_id: None,
            start_date: None,
            end_date: None,
        })
        .await;
    assert_eq!(all.data, Some(json!({ "agents": 4 })));

    let one = gw
        .get_agent_statistics(&AgentStatisticsQuery {
            domain: "example.com".to_string(),
            agent_id: Some("1001".to_string()),
            start_date: Some("2024-02-01".to_string()),
            end_date: None,
        })
        .await;
    assert_eq!(one.data, Some(json!({ "calls": 12 })));
    assert_eq!(
        mock.requests()[1].query_param("start_time").as_deref(),
        Some("2024-02-01")
    );
    Ok(())
}

#[tokio::test]
async fn phone_numbers_limit_is_optional() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get(
        "/domains/example.com/phonenumbers",
        MockResponse::json(json!([{ "number": "15551234567" }])),
    );
    let gw = gateway(&mock);

    gw.get_phone_numbers(&PhoneNumberListQuery {
        domain: "example.com".to_string(),
        limit: None,
    })
    .await;
    gw.get_phone_numbers(&PhoneNumberListQuery {
        domain: "example.com".to_string(),
        limit: Some(3),
    })
    .await;

    let requests = mock.requests();
    assert_eq!(requests[0].query, None);
    assert_eq!(requests[1].query_param("limit").as_deref(), Some("3"));
    Ok(())
}

#[tokio::test]
async fn test_connection_reports_reachability_not_content() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get("/domains", MockResponse::json(json!([])));

    let r = gateway(&mock).test_connection().await;
    assert!(r.success);
    assert_eq!(r.data.map(|s| s.connected), Some(true));
    assert_eq!(
        mock.only_request().query_param("limit").as_deref(),
        Some("1")
    );
    Ok(())
}

#[tokio::test]
async fn test_connection_failure_reports_disconnected() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get("/domains", MockResponse::status(401, json!({ "error": "bad token" })));

    let r = gateway(&mock).test_connection().await;
    assert!(!r.success);
    assert_eq!(r.data.map(|s| s.connected), Some(false));
    assert_eq!(
        r.error.as_deref(),
        Some("Request failed with status code 401")
    );
    Ok(())
}

#[tokio::test]
async fn rate_limit_refuses_without_calling_the_api() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get("/domains/example.com", MockResponse::json(json!({ "domain": "example.com" })));

    let gw = NsApiClient::new(GatewayConfig::new(mock.api_url(), "t").with_rate_limit(
        RateLimitConfig {
            requests: 2,
            per: Duration::from_secs(60),
        },
    ))
    .expect("gateway");

    assert!(gw.get_domain(&domain("example.com")).await.success);
    assert!(gw.get_domain(&domain("example.com")).await.success);

    let third = gw.get_domain(&domain("example.com")).await;
    assert!(!third.success);
    assert_eq!(third.data, None);
    assert!(third.error_text().starts_with("Rate limit exceeded"));
    assert_eq!(mock.request_count(), 2);
    Ok(())
}
