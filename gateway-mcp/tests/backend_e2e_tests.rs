//! End-to-end tests for the project catalog.
//!
//! A wiremock server stands in for the project-management backend. Requests
//! go through the real `Dispatcher` so capability checks, argument parsing
//! and result wrapping are exercised together with the HTTP calls.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gateway_auth::{CredentialRecord, CredentialSource};
use gateway_mcp::clients::{BackendClient, BackendConfig, BackendError};
use gateway_mcp::{project_catalog, DispatchError, Dispatcher, McpRequest, RetryConfig};
use gateway_rbac::CredentialKind;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test fixture wiring a dispatcher to a mock backend.
struct TestFixture {
    /// Mock backend server.
    server: MockServer,
    /// Backend client pointed at the mock server.
    client: Arc<BackendClient>,
    /// Dispatcher over the default project catalog.
    dispatcher: Dispatcher,
}

impl TestFixture {
    /// Create a new fixture with a fast retry policy.
    async fn new() -> Self {
        let server = MockServer::start().await;

        let config = BackendConfig {
            base_url: server.uri(),
            api_key: Some("test-backend-key".to_string()),
            timeout_secs: 5,
            max_retries: 3,
        };
        let retry = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
        };
        let client = Arc::new(BackendClient::new(config).unwrap().with_retry(retry));
        let dispatcher = Dispatcher::with_catalog(project_catalog(client.clone()));

        Self {
            server,
            client,
            dispatcher,
        }
    }

    /// Dispatch a request as a caller of the given kind.
    async fn call(&self, kind: CredentialKind, request: McpRequest) -> Result<Value, DispatchError> {
        let record = credential(kind);
        self.dispatcher.handle(&request, &record, Some("req-1")).await
    }
}

fn credential(kind: CredentialKind) -> CredentialRecord {
    CredentialRecord::new(
        format!("test-{}", kind),
        kind,
        Utc::now(),
        None,
        None,
        CredentialSource::Static,
    )
}

fn tool_call(name: &str, arguments: Value) -> McpRequest {
    McpRequest::new("tools/call")
        .with_id(1)
        .with_params(json!({ "name": name, "arguments": arguments }))
}

fn text_of(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap()
}

// =============================================================================
// Backend client
// =============================================================================

#[tokio::test]
async fn test_list_projects_sends_bearer_key() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(header("Authorization", "Bearer test-backend-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "p1", "name": "Checkout"},
            {"id": "p2", "name": "Search"}
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let projects = fixture.client.list_projects().await.unwrap();
    assert_eq!(projects.as_array().unwrap().len(), 2);
    assert_eq!(projects[1]["name"], "Search");
}

#[tokio::test]
async fn test_get_retries_transient_failures() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/p1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let project = fixture.client.get_project("p1").await.unwrap();
    assert_eq!(project["id"], "p1");
}

#[tokio::test]
async fn test_post_is_not_retried() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let err = fixture
        .client
        .create_project(&gateway_mcp::clients::NewProject {
            name: "Billing".into(),
            description: None,
        })
        .await
        .unwrap_err();

    match err {
        BackendError::ApiError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_status_mapping() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/projects/secret"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&fixture.server)
        .await;

    assert!(matches!(
        fixture.client.get_project("missing").await,
        Err(BackendError::NotFound(_))
    ));
    assert!(matches!(
        fixture.client.get_project("secret").await,
        Err(BackendError::AuthenticationFailed)
    ));
}

// =============================================================================
// Tools through the dispatcher
// =============================================================================

#[tokio::test]
async fn test_list_projects_tool_wraps_result_as_text() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "p1"}])))
        .mount(&fixture.server)
        .await;

    let result = fixture
        .call(CredentialKind::Readonly, tool_call("list_projects", json!({})))
        .await
        .unwrap();

    let decoded: Value = serde_json::from_str(text_of(&result)).unwrap();
    assert_eq!(decoded, json!([{"id": "p1"}]));
    assert!(result.get("isError").is_none());
}

#[tokio::test]
async fn test_readonly_cannot_create_project() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "p9"})))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let err = fixture
        .call(
            CredentialKind::Readonly,
            tool_call("create_project", json!({"name": "Billing"})),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::InsufficientPermissions(ref name) if name == "create_project"));
}

#[tokio::test]
async fn test_team_creates_story() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/projects/p1/stories"))
        .and(body_json(json!({
            "title": "Guest checkout",
            "acceptanceCriteria": ["no account needed"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "s1"})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let result = fixture
        .call(
            CredentialKind::Team,
            tool_call(
                "create_story",
                json!({
                    "projectId": "p1",
                    "title": "Guest checkout",
                    "acceptanceCriteria": ["no account needed"]
                }),
            ),
        )
        .await
        .unwrap();

    assert!(text_of(&result).contains("\"s1\""));
}

#[tokio::test]
async fn test_backend_failure_becomes_tool_failure() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.server)
        .await;

    let err = fixture
        .call(
            CredentialKind::Readonly,
            tool_call("get_project", json!({"projectId": "gone"})),
        )
        .await
        .unwrap_err();

    match err {
        DispatchError::ToolFailed { name, cause } => {
            assert_eq!(name, "get_project");
            assert!(cause.contains("Not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_tools_list_is_filtered_by_kind() {
    let fixture = TestFixture::new().await;
    let request = McpRequest::new("tools/list").with_id(2);

    let names = |result: Value| -> Vec<String> {
        result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect()
    };

    let readonly = fixture
        .call(CredentialKind::Readonly, request.clone())
        .await
        .unwrap();
    assert_eq!(names(readonly), vec!["get_project", "list_projects"]);

    let team = fixture.call(CredentialKind::Team, request).await.unwrap();
    assert_eq!(team["tools"].as_array().unwrap().len(), 4);
}

// =============================================================================
// Resources and prompts
// =============================================================================

#[tokio::test]
async fn test_read_project_resource() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .mount(&fixture.server)
        .await;

    let result = fixture
        .call(
            CredentialKind::Readonly,
            McpRequest::new("resources/read").with_params(json!({"uri": "project://p1"})),
        )
        .await
        .unwrap();

    let contents = &result["contents"][0];
    assert_eq!(contents["uri"], "project://p1");
    assert_eq!(contents["mimeType"], "text/plain");
    let decoded: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
    assert_eq!(decoded["id"], "p1");
}

#[tokio::test]
async fn test_story_breakdown_prompt() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Checkout"})))
        .mount(&fixture.server)
        .await;

    let result = fixture
        .call(
            CredentialKind::Readonly,
            McpRequest::new("prompts/get").with_params(json!({
                "name": "story_breakdown",
                "arguments": {"projectId": "p1", "feature": "gift cards"}
            })),
        )
        .await
        .unwrap();

    let messages = result["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(result["description"].as_str().unwrap().contains("user stories"));
}

#[tokio::test]
async fn test_prompt_missing_argument_fails() {
    let fixture = TestFixture::new().await;

    let err = fixture
        .call(
            CredentialKind::Readonly,
            McpRequest::new("prompts/get").with_params(json!({
                "name": "project_summary",
                "arguments": {}
            })),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::PromptGetFailed { .. }));
}
