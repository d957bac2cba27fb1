//! Router-level tests: real SQLite (tempfile), real Argon2 and JWT, stubbed
//! completion provider. Requests go through `tower::ServiceExt::oneshot`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use supportdesk_core::chat::orchestrator::{APOLOGY_RATE_LIMITED, APOLOGY_TECHNICAL};
use supportdesk_core::llm::box_provider::BoxCompletionProvider;
use supportdesk_core::llm::provider::CompletionProvider;
use supportdesk_infra::crypto::password::Argon2PasswordHasher;
use supportdesk_infra::sqlite::pool::DatabasePool;
use supportdesk_types::config::{AppConfig, Environment, RateLimitRule};
use supportdesk_types::llm::{CompletionError, CompletionRequest, CompletionResponse, Usage};

use crate::http::router::build_router;
use crate::state::AppState;

const SECRET: &str = "router-test-secret-with-at-least-32-bytes";

/// Answers every request the same way and counts calls.
#[derive(Clone)]
struct StubProvider {
    outcome: Result<&'static str, CompletionError>,
    calls: Arc<AtomicUsize>,
}

impl StubProvider {
    fn replying(text: &'static str) -> Self {
        Self {
            outcome: Ok(text),
            calls: Arc::default(),
        }
    }

    fn failing(error: CompletionError) -> Self {
        Self {
            outcome: Err(error),
            calls: Arc::default(),
        }
    }
}

impl CompletionProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(
        &self,
        _request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map(|text| CompletionResponse {
            content: text.to_string(),
            model: "stub-model".to_string(),
            usage: Usage::default(),
        })
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.environment = Environment::Test;
    config.auth.secret = SECRET.to_string();
    config.rate_limit.general = Some(RateLimitRule::new(10_000, 60));
    config.rate_limit.auth = Some(RateLimitRule::new(10_000, 60));
    config.rate_limit.chat = Some(RateLimitRule::new(10_000, 60));
    config
}

async fn app_with(config: AppConfig, provider: StubProvider) -> Router {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
    // Leak tempdir so it lives for the test
    std::mem::forget(dir);
    let pool = DatabasePool::new(&url).await.unwrap();

    let state = AppState::from_parts(
        config,
        pool,
        BoxCompletionProvider::new(provider),
        Argon2PasswordHasher::with_params(256, 1, 1).unwrap(),
    );
    build_router(state)
}

async fn app(provider: StubProvider) -> Router {
    app_with(test_config(), provider).await
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn signup(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"email": email, "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_signup_then_login() {
    let app = app(StubProvider::replying("hi")).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"email": "Ada@Example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["token"].as_str().unwrap().contains('.'));

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, _) = call(&app, Method::GET, "/chat/history", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_401() {
    let app = app(StubProvider::replying("hi")).await;
    signup(&app, "ada@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "wrong-one"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_duplicate_signup_is_409() {
    let app = app(StubProvider::replying("hi")).await;
    signup(&app, "ada@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"email": "ADA@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn test_signup_validation_lists_fields() {
    let app = app(StubProvider::replying("hi")).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"email": "nope", "password": "123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_token_rejections() {
    let app = app(StubProvider::replying("hi")).await;

    let (status, body) = call(&app, Method::GET, "/chat/history", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access token required");

    let (status, body) = call(&app, Method::GET, "/chat/history", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid token");

    let past = chrono::Utc::now().timestamp() - 7200;
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({
            "sub": uuid_string(),
            "iss": "ai-support-app",
            "iat": past,
            "exp": past + 60,
        }),
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    let (status, body) = call(&app, Method::GET, "/chat/history", Some(&expired), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Token expired");
}

fn uuid_string() -> String {
    supportdesk_types::user::UserId::new().to_string()
}

#[tokio::test]
async fn test_token_for_unknown_user_is_401() {
    let app = app(StubProvider::replying("hi")).await;
    let now = chrono::Utc::now().timestamp();
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({"sub": uuid_string(), "iss": "ai-support-app", "iat": now, "exp": now + 600}),
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let (status, body) = call(&app, Method::GET, "/chat/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_first_message_creates_titled_conversation() {
    let app = app(StubProvider::replying("Hi! How can I help?")).await;
    let token = signup(&app, "ada@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/chat/send",
        Some(&token),
        Some(json!({"message": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hi! How can I help?");
    assert_eq!(body["messageCount"], 2);
    let chat_id = body["chatId"].as_str().unwrap().to_string();

    let (_, history) = call(&app, Method::GET, "/chat/history", Some(&token), None).await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["limit"], 10);
    assert_eq!(history["chats"][0]["id"], chat_id.as_str());
    assert!(history["chats"][0]["title"].as_str().unwrap().starts_with("Hello"));
    assert_eq!(history["chats"][0]["lastMessage"]["role"], "assistant");

    let (status, body) = call(&app, Method::GET, &format!("/chat/{chat_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let turns = body["chat"]["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["content"], "Hello");
}

#[tokio::test]
async fn test_upstream_rate_limit_answers_with_apology() {
    let app = app(StubProvider::failing(CompletionError::RateLimited)).await;
    let token = signup(&app, "ada@example.com").await;

    let (status, first) = call(
        &app,
        Method::POST,
        "/chat/send",
        Some(&token),
        Some(json!({"message": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["message"], APOLOGY_RATE_LIMITED);
    assert_eq!(first["messageCount"], 2);

    let (status, second) = call(
        &app,
        Method::POST,
        "/chat/send",
        Some(&token),
        Some(json!({"message": "Anyone there?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["chatId"], first["chatId"]);
    assert_eq!(second["messageCount"], 4);
}

#[tokio::test]
async fn test_unavailable_upstream_answers_with_technical_apology() {
    let app = app(StubProvider::failing(CompletionError::Unavailable {
        status: Some(503),
        message: "down".into(),
    }))
    .await;
    let token = signup(&app, "ada@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/chat/send",
        Some(&token),
        Some(json!({"message": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], APOLOGY_TECHNICAL);
}

#[tokio::test]
async fn test_blank_message_is_rejected_before_completion() {
    let provider = StubProvider::replying("hi");
    let calls = provider.calls.clone();
    let app = app(provider).await;
    let token = signup(&app, "ada@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/chat/send",
        Some(&token),
        Some(json!({"message": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "message");

    let (status, _) = call(&app, Method::POST, "/chat/send", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = app(StubProvider::replying("hi")).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_twice() {
    let app = app(StubProvider::replying("hi")).await;
    let token = signup(&app, "ada@example.com").await;

    let (status, body) = call(&app, Method::POST, "/chat/new", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["chat"]["title"], "New Chat");
    let id = body["chat"]["id"].as_str().unwrap().to_string();
    let path = format!("/chat/{id}");

    let (status, body) = call(&app, Method::DELETE, &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Chat deleted successfully");
    assert_eq!(body["chatId"], id.as_str());

    let (status, _) = call(&app, Method::GET, &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::DELETE, &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, history) = call(&app, Method::GET, "/chat/history", Some(&token), None).await;
    assert_eq!(history["total"], 0);
}

#[tokio::test]
async fn test_other_users_chat_is_404() {
    let app = app(StubProvider::replying("hi")).await;
    let owner = signup(&app, "owner@example.com").await;
    let intruder = signup(&app, "intruder@example.com").await;

    let (_, body) = call(&app, Method::POST, "/chat/new", Some(&owner), None).await;
    let path = format!("/chat/{}", body["chat"]["id"].as_str().unwrap());

    let (status, body) = call(&app, Method::GET, &path, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Chat not found");
    let (status, _) = call(&app, Method::DELETE, &path, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, &path, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_chat_id_is_404() {
    let app = app(StubProvider::replying("hi")).await;
    let token = signup(&app, "ada@example.com").await;
    let (status, _) = call(&app, Method::GET, "/chat/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_is_most_recent_first_and_limited() {
    let app = app(StubProvider::replying("hi")).await;
    let token = signup(&app, "ada@example.com").await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (_, body) = call(&app, Method::POST, "/chat/new", Some(&token), None).await;
        ids.push(body["chat"]["id"].as_str().unwrap().to_string());
    }
    // Sending touches the most recently updated chat (the last one created).
    call(
        &app,
        Method::POST,
        "/chat/send",
        Some(&token),
        Some(json!({"message": "bump"})),
    )
    .await;

    let (_, history) = call(&app, Method::GET, "/chat/history", Some(&token), None).await;
    let listed: Vec<&str> = history["chats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec![ids[2].as_str(), ids[1].as_str(), ids[0].as_str()]);

    let (_, limited) = call(&app, Method::GET, "/chat/history?limit=2", Some(&token), None).await;
    assert_eq!(limited["limit"], 2);
    assert_eq!(limited["total"], 2);

    let (_, clamped) = call(&app, Method::GET, "/chat/history?limit=500", Some(&token), None).await;
    assert_eq!(clamped["limit"], 100);
}

#[tokio::test]
async fn test_health_and_info() {
    let app = app(StubProvider::replying("hi")).await;

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["environment"], "test");

    let (status, body) = call(&app, Method::GET, "/api/info", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "AI Customer Support API");
    assert_eq!(body["features"]["authentication"], true);
    assert_eq!(body["features"]["aiChat"], false);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = app(StubProvider::replying("hi")).await;
    let (status, body) = call(&app, Method::GET, "/nope/deeper", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
    assert_eq!(body["path"], "/nope/deeper");
    assert_eq!(body["method"], "GET");
}

#[tokio::test]
async fn test_chat_rate_limit_returns_429() {
    let mut config = test_config();
    config.rate_limit.chat = Some(RateLimitRule::new(2, 60));
    let app = app_with(config, StubProvider::replying("hi")).await;
    let token = signup(&app, "ada@example.com").await;

    for _ in 0..2 {
        let (status, _) = call(&app, Method::GET, "/chat/history", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = call(&app, Method::GET, "/chat/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded");
    assert_eq!(body["message"], "Too many messages, please slow down");

    // Other groups are unaffected.
    let (status, _) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

async fn login_from(app: &Router, peer: [u8; 4], forwarded_for: &str) -> StatusCode {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(
            json!({"email": "nobody@example.com", "password": "wrong-password"}).to_string(),
        ))
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 5000))));
    app.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_bypass_auth_limit() {
    let mut config = test_config();
    config.rate_limit.auth = Some(RateLimitRule::new(2, 900));
    let app = app_with(config, StubProvider::replying("hi")).await;

    let mut statuses = Vec::new();
    for i in 0..10 {
        statuses.push(login_from(&app, [203, 0, 113, 7], &format!("198.51.100.{i}")).await);
    }
    assert_eq!(statuses[..2], [StatusCode::UNAUTHORIZED, StatusCode::UNAUTHORIZED]);
    assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));

    // A different peer still has its own quota.
    assert_eq!(
        login_from(&app, [203, 0, 113, 8], "198.51.100.1").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_trusted_proxy_keys_on_forwarded_for() {
    let mut config = test_config();
    config.rate_limit.auth = Some(RateLimitRule::new(2, 900));
    config.rate_limit.trust_proxy = true;
    let app = app_with(config, StubProvider::replying("hi")).await;

    let proxy = [10, 0, 0, 1];
    for _ in 0..2 {
        assert_eq!(login_from(&app, proxy, "198.51.100.1").await, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(
        login_from(&app, proxy, "198.51.100.1").await,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(login_from(&app, proxy, "198.51.100.2").await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_security_headers_only_in_production() {
    let app = app(StubProvider::replying("hi")).await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().get("x-frame-options").is_none());

    let mut config = test_config();
    config.environment = Environment::Production;
    let app = app_with(config, StubProvider::replying("hi")).await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
}

#[tokio::test]
async fn test_cors_allows_development_frontend() {
    let mut config = test_config();
    config.environment = Environment::Development;
    let app = app_with(config, StubProvider::replying("hi")).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/auth/login")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}
