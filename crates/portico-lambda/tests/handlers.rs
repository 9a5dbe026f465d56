//! End-to-end tests through the route table.
//!
//! The state is built from in-memory stores and scripted model/search
//! doubles; one test drives the real OpenAI client against wiremock.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lambda_http::http::header::{COOKIE, SET_COOKIE};
use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Context, Request, RequestExt, Response};
use portico_core::auth::password_digest;
use portico_core::feature_request::InMemoryFeatureRequestStore;
use portico_core::llm::CompletionRequest;
use portico_core::{
    AppConfig, ChatMessage, ChatModel, FeatureRequestStore, GateConfig, OpenAiConfig,
    ProviderError, StaticStore, WebSearch,
};
use portico_lambda::{handle_request, AppState};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SIGNING_KEY: &str = include_str!("../../portico-core/tests/fixtures/signing_key_pkcs8.pem");
const ORIGIN: &str = "https://www.example.com";

/// Replies with `reply`, or fails with a 500 when `reply` is `None`.
struct FixedModel {
    reply: Option<String>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl FixedModel {
    fn answering(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for FixedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ProviderError> {
        self.calls.lock().unwrap().push(request);
        match &self.reply {
            Some(reply) => Ok(ChatMessage::assistant(reply.clone())),
            None => Err(ProviderError::Status {
                status: 500,
                message: "upstream exploded".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

struct NoSearch;

#[async_trait]
impl WebSearch for NoSearch {
    async fn search(&self, _query: &str) -> Result<Vec<Value>, ProviderError> {
        Ok(Vec::new())
    }
}

fn config() -> AppConfig {
    AppConfig {
        gate: GateConfig::default()
            .with_auth_secret_name("portico/auth")
            .with_private_key_secret_name("portico/key")
            .with_key_pair_id("K2JCJMDEHXQW5F"),
        cors_allowed_origin: Some(ORIGIN.to_string()),
        ..AppConfig::default()
    }
}

fn secrets() -> Arc<StaticStore> {
    Arc::new(
        StaticStore::new()
            .with_value(
                "portico/auth",
                json!({"username": "editor", "passwordHash": password_digest("s3cret-pass")})
                    .to_string(),
            )
            .with_value("portico/key", SIGNING_KEY),
    )
}

struct Harness {
    state: Arc<AppState>,
    model: Arc<FixedModel>,
    features: Arc<InMemoryFeatureRequestStore>,
}

fn harness_with(model: Arc<FixedModel>) -> Harness {
    let features = Arc::new(InMemoryFeatureRequestStore::new());
    let state = AppState::new(
        config(),
        secrets(),
        Arc::new(StaticStore::new()),
        Some(features.clone() as Arc<dyn FeatureRequestStore>),
    )
    .with_model(model.clone())
    .with_search(Arc::new(NoSearch));

    Harness {
        state: Arc::new(state),
        model,
        features,
    }
}

fn harness() -> Harness {
    harness_with(FixedModel::answering("Hello from the model"))
}

fn request(method: Method, uri: &str, body: Option<&str>) -> Request {
    let body = match body {
        Some(text) => Body::Text(text.to_string()),
        None => Body::Empty,
    };
    lambda_http::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

async fn send(state: &Arc<AppState>, request: Request) -> Response<Body> {
    handle_request(state.clone(), request).await.unwrap()
}

fn json_body(response: &Response<Body>) -> Value {
    match response.body() {
        Body::Text(text) => serde_json::from_str(text).unwrap(),
        Body::Binary(bytes) => serde_json::from_slice(bytes).unwrap(),
        Body::Empty => Value::Null,
    }
}

fn header_value<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_auth_sets_three_cookies() {
    let h = harness();
    let response = send(
        &h.state,
        request(
            Method::POST,
            "/auth",
            Some(r#"{"username":"editor","password":"s3cret-pass"}"#),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(&response);
    assert_eq!(body["message"], "Authentication successful");
    assert!(body["expireTime"].as_i64().unwrap() > 0);

    let cookies: Vec<&str> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(cookies.len(), 3);
    for (cookie, name) in cookies.iter().zip([
        "CloudFront-Policy=",
        "CloudFront-Signature=",
        "CloudFront-Key-Pair-Id=K2JCJMDEHXQW5F",
    ]) {
        assert!(cookie.starts_with(name), "{cookie}");
        assert!(cookie.ends_with("Path=/; Secure; HttpOnly; SameSite=None"));
    }

    assert_eq!(header_value(&response, "access-control-allow-origin"), Some(ORIGIN));
    assert_eq!(
        header_value(&response, "access-control-allow-credentials"),
        Some("true")
    );
}

#[tokio::test]
async fn test_auth_rejects_bad_credentials_without_cookies() {
    let h = harness();
    for body in [
        r#"{"username":"editor","password":"wrong"}"#,
        r#"{"username":"nobody","password":"s3cret-pass"}"#,
    ] {
        let response = send(&h.state, request(Method::POST, "/auth", Some(body))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(&response), json!({"error": "Invalid credentials"}));
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}

#[tokio::test]
async fn test_auth_body_validation() {
    let h = harness();

    let response = send(&h.state, request(Method::POST, "/auth", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&response), json!({"error": "Request body is missing"}));

    let response = send(&h.state, request(Method::POST, "/auth", Some("{nope"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(&response),
        json!({"error": "Invalid JSON in request body"})
    );
}

#[tokio::test]
async fn test_auth_check_follows_issued_cookies() {
    let h = harness();
    let issued = send(
        &h.state,
        request(
            Method::POST,
            "/auth",
            Some(r#"{"username":"editor","password":"s3cret-pass"}"#),
        ),
    )
    .await;

    let cookie_header = issued
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ");

    let mut check = request(Method::GET, "/auth/check", None);
    check
        .headers_mut()
        .insert(COOKIE, cookie_header.parse().unwrap());
    let response = send(&h.state, check).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(&response), json!({"authenticated": true}));

    let response = send(&h.state, request(Method::GET, "/auth/check", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&response), json!({"authenticated": false}));
}

#[tokio::test]
async fn test_chat_returns_model_content() {
    let h = harness();
    let response = send(
        &h.state,
        request(
            Method::POST,
            "/chat",
            Some(r#"{"messages":[{"role":"user","content":"hello"}]}"#),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(&response), json!({"response": "Hello from the model"}));
    assert_eq!(header_value(&response, "access-control-allow-origin"), Some("*"));
    assert!(response
        .headers()
        .get("access-control-allow-credentials")
        .is_none());
}

#[tokio::test]
async fn test_chat_body_validation() {
    let h = harness();

    let cases = [
        (None, "Request body is missing"),
        (Some("not json"), "Invalid JSON in request body"),
        (Some(r#"{"messages":[]}"#), "Invalid messages format"),
    ];
    for (body, expected) in cases {
        let response = send(&h.state, request(Method::POST, "/chat", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&response), json!({ "error": expected }));
    }
    assert_eq!(h.model.call_count(), 0);
}

#[tokio::test]
async fn test_model_failure_is_500_with_request_id() {
    let h = harness_with(FixedModel::failing());

    let mut context = Context::default();
    context.request_id = "req-abc-123".to_string();
    let req = request(
        Method::POST,
        "/chat",
        Some(r#"{"messages":[{"role":"user","content":"hello"}]}"#),
    )
    .with_lambda_context(context);

    let response = send(&h.state, req).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(&response),
        json!({"error": "Internal server error", "requestId": "req-abc-123"})
    );
}

#[tokio::test]
async fn test_search_direct_answer() {
    let h = harness();
    let response = send(
        &h.state,
        request(
            Method::POST,
            "/search",
            Some(r#"{"messages":[{"role":"user","content":"hello"}]}"#),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(&response), json!({"response": "Hello from the model"}));
    assert_eq!(h.model.call_count(), 1);
}

#[tokio::test]
async fn test_preflight_and_unknown_routes() {
    let h = harness();

    let response = send(&h.state, request(Method::OPTIONS, "/chat", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(matches!(response.body(), Body::Empty));
    assert_eq!(
        header_value(&response, "access-control-allow-methods"),
        Some("POST, OPTIONS")
    );

    let response = send(&h.state, request(Method::OPTIONS, "/auth/check", None)).await;
    assert_eq!(
        header_value(&response, "access-control-allow-methods"),
        Some("GET, OPTIONS")
    );
    assert_eq!(header_value(&response, "access-control-allow-origin"), Some(ORIGIN));

    let response = send(&h.state, request(Method::GET, "/nowhere", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(&response), json!({"error": "Not found"}));

    let response = send(&h.state, request(Method::GET, "/chat", None)).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(&response), json!({"error": "Method not allowed"}));

    let response = send(
        &h.state,
        request(
            Method::POST,
            "/chat/",
            Some(r#"{"messages":[{"role":"user","content":"hi"}]}"#),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_feature_request_created() {
    let h = harness();
    let response = send(
        &h.state,
        request(
            Method::POST,
            "/feature-request",
            Some(r#"{"title":"Dark mode","description":"Please add a dark theme"}"#),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(&response);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["requesterEmail"], Value::Null);
    assert_eq!(body["title"], "Dark mode");

    let stored = h.features.records();
    assert_eq!(stored.len(), 1);
    assert_eq!(body["id"], stored[0].id.as_str());

    let response = send(
        &h.state,
        request(Method::POST, "/feature-request", Some(r#"{"title":"x"}"#)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(&response),
        json!({"error": "Title and description are required"})
    );

    let response = send(&h.state, request(Method::POST, "/feature-request", None)).await;
    assert_eq!(json_body(&response), json!({"error": "Request body is required"}));
}

#[tokio::test]
async fn test_feature_request_without_table_is_500() {
    let state = Arc::new(AppState::new(
        config(),
        secrets(),
        Arc::new(StaticStore::new()),
        None,
    ));
    let response = send(
        &state,
        request(
            Method::POST,
            "/feature-request",
            Some(r#"{"title":"t","description":"d"}"#),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_chat_builds_openai_client_from_parameter_store() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-from-ssm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "wired"}}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let params = Arc::new(StaticStore::new().with_value("/chat-api/openai-key", "sk-from-ssm"));
    let config = AppConfig {
        openai: OpenAiConfig::default()
            .with_api_key_parameter("/chat-api/openai-key")
            .with_base_url(format!("{}/v1", server.uri())),
        ..config()
    };
    let state = Arc::new(AppState::new(config, secrets(), params.clone(), None));

    for _ in 0..2 {
        let response = send(
            &state,
            request(
                Method::POST,
                "/chat",
                Some(r#"{"messages":[{"role":"user","content":"hello"}]}"#),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(&response), json!({"response": "wired"}));
    }
    assert_eq!(params.lookups(), 1, "API key should be fetched once");
}

#[tokio::test]
async fn test_chat_without_key_parameter_is_500() {
    let state = Arc::new(AppState::new(
        config(),
        secrets(),
        Arc::new(StaticStore::new()),
        None,
    ));
    let response = send(
        &state,
        request(
            Method::POST,
            "/chat",
            Some(r#"{"messages":[{"role":"user","content":"hello"}]}"#),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&response)["error"], "Internal server error");
}

/// A REST API proxy event as delivered for a deployed stage.
fn rest_api_event(
    method: &str,
    path: &str,
    stage: &str,
    cookie: Option<&str>,
    body: Option<&str>,
) -> Request {
    let mut headers = json!({
        "Host": "abc123.execute-api.us-east-1.amazonaws.com",
        "Content-Type": "application/json",
        "Origin": ORIGIN
    });
    if let Some(cookie) = cookie {
        headers["Cookie"] = json!(cookie);
    }
    let multi_value_headers: serde_json::Map<String, Value> = headers
        .as_object()
        .unwrap()
        .iter()
        .map(|(name, value)| (name.clone(), json!([value])))
        .collect();

    let event = json!({
        "resource": path,
        "path": path,
        "httpMethod": method,
        "headers": headers,
        "multiValueHeaders": multi_value_headers,
        "queryStringParameters": null,
        "multiValueQueryStringParameters": null,
        "pathParameters": null,
        "stageVariables": null,
        "requestContext": {
            "accountId": "123456789012",
            "resourceId": "abc123",
            "stage": stage,
            "requestId": "c6af9ac6-7b61-11e6-9a41-93e8deadbeef",
            "identity": {
                "sourceIp": "203.0.113.10",
                "userAgent": "curl/8.0"
            },
            "resourcePath": path,
            "httpMethod": method,
            "apiId": "abc123",
            "path": format!("/{stage}{path}"),
            "protocol": "HTTP/1.1"
        },
        "body": body,
        "isBase64Encoded": false
    });

    lambda_http::request::from_str(&event.to_string()).unwrap()
}

#[tokio::test]
async fn test_stage_prefix_is_not_part_of_the_route() {
    let h = harness();

    let response = send(
        &h.state,
        rest_api_event("GET", "/auth/check", "prod", None, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&response), json!({"authenticated": false}));

    let response = send(
        &h.state,
        rest_api_event("OPTIONS", "/auth", "prod", None, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, "access-control-allow-origin"), Some(ORIGIN));
}

#[tokio::test]
async fn test_cookies_issued_through_stage_event_check_true() {
    let h = harness();

    let issued = send(
        &h.state,
        rest_api_event(
            "POST",
            "/auth",
            "prod",
            None,
            Some(r#"{"username":"editor","password":"s3cret-pass"}"#),
        ),
    )
    .await;
    assert_eq!(issued.status(), StatusCode::OK);

    let cookie_header = issued
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ");

    let response = send(
        &h.state,
        rest_api_event("GET", "/auth/check", "prod", Some(&cookie_header), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(&response), json!({"authenticated": true}));
}
