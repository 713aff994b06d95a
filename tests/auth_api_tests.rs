//! End-to-end tests of the auth API over the axum router
//!
//! Requests go through `tower::ServiceExt::oneshot` against an in-memory
//! user store, so no network or database is needed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use authpair_server::auth::{BcryptHasher, CredentialService, RefreshCookie, TokenCodec};
use authpair_server::models::User;
use authpair_server::routes::create_router;
use authpair_server::state::AppState;
use authpair_server::store::{InMemoryUserStore, StoreError, UserStore};

// ============================================================================
// Helpers
// ============================================================================

/// Store whose backend is down
struct UnavailableStore;

#[async_trait]
impl UserStore for UnavailableStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database("secret-detail".to_string()))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database("secret-detail".to_string()))
    }

    async fn create(&self, _email: &str, _password_hash: &str) -> Result<User, StoreError> {
        Err(StoreError::Database("secret-detail".to_string()))
    }

    async fn update_refresh_hash(&self, _id: Uuid, _hash: Option<&str>) -> Result<(), StoreError> {
        Err(StoreError::Database("secret-detail".to_string()))
    }
}

fn test_app() -> Router {
    app_with_store(Arc::new(InMemoryUserStore::new()))
}

fn app_with_store(store: Arc<dyn UserStore>) -> Router {
    let codec = Arc::new(TokenCodec::new(
        "test-access-secret",
        "test-refresh-secret",
        Duration::seconds(60),
        Duration::days(7),
    ));
    let credentials = Arc::new(CredentialService::new(
        store.clone(),
        Arc::new(BcryptHasher::new(4)),
        codec,
    ));
    let state = AppState::new(
        credentials,
        store,
        RefreshCookie::new(false, Duration::days(7)),
    );
    create_router(state, None)
}

fn json_request(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn session_request(path: &str, access_token: Option<&str>, refresh_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(path);
    if let Some(token) = access_token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(token) = refresh_token {
        builder = builder.header(header::COOKIE, format!("refresh_token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Value of the refresh cookie set on the response, if any
fn refresh_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refresh_token="))
        .map(|v| v.to_string())
}

fn cookie_value(set_cookie: &str) -> String {
    set_cookie
        .trim_start_matches("refresh_token=")
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string()
}

async fn register(app: &Router, email: &str, password: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = cookie_value(&refresh_cookie(&response).expect("refresh cookie set"));
    let body = body_json(response).await;
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();
    (access, cookie)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_register_login_and_access_protected_route() {
    let app = test_app();

    // Register
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            json!({ "email": "a@x.com", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = refresh_cookie(&response).expect("refresh cookie set");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=604800"));

    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["message"], "Success");
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"].get("refreshToken").is_none());

    // Wrong password
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            json!({ "email": "a@x.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(refresh_cookie(&response).is_none());

    // Correct password
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            json!({ "email": "a@x.com", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let refresh = cookie_value(&refresh_cookie(&response).expect("new refresh cookie"));
    let body = body_json(response).await;
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();

    // Guarded route with the new pair
    let response = app
        .clone()
        .oneshot(session_request("/api/users/test", Some(&access), Some(&refresh)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "a@x.com");
    assert!(body["data"]["userId"].is_string());
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let app = test_app();
    register(&app, "a@x.com", "secret1").await;

    let wrong_password = app
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            json!({ "email": "a@x.com", "password": "wrong1" }),
        ))
        .await
        .unwrap();
    let unknown_email = app
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            json!({ "email": "nobody@x.com", "password": "wrong1" }),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), unknown_email.status());
    let a = body_json(wrong_password).await;
    let b = body_json(unknown_email).await;
    assert_eq!(a["error"], b["error"]);
    assert_eq!(a["error"]["message"], "invalid credentials");
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = test_app();
    register(&app, "a@x.com", "secret1").await;

    let response = app
        .oneshot(json_request(
            "/api/auth/register",
            json!({ "email": "a@x.com", "password": "another1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Error");
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = test_app();

    let bad_email = app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            json!({ "email": "not-an-email", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);

    let short_password = app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            json!({ "email": "a@x.com", "password": "123" }),
        ))
        .await
        .unwrap();
    assert_eq!(short_password.status(), StatusCode::BAD_REQUEST);
    let body = body_json(short_password).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let malformed = app
        .oneshot(json_request("/api/auth/register", json!({ "email": 42 })))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_rotates_cookie() {
    let app = test_app();
    let (_, original) = register(&app, "a@x.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(session_request("/api/auth/refresh", None, Some(&original)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = cookie_value(&refresh_cookie(&response).expect("rotated cookie"));
    assert_ne!(rotated, original);
    let body = body_json(response).await;
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();

    // New pair is admitted
    let response = app
        .clone()
        .oneshot(session_request("/api/users/test", Some(&access), Some(&rotated)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The spent refresh token is not
    let response = app
        .oneshot(session_request("/api/auth/refresh", None, Some(&original)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let app = test_app();

    let response = app
        .oneshot(session_request("/api/auth/refresh", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "refresh token not found");
}

#[tokio::test]
async fn test_logout_revokes_refresh_chain() {
    let app = test_app();
    let (access, refresh) = register(&app, "a@x.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(session_request("/api/auth/logout", Some(&access), Some(&refresh)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = refresh_cookie(&response).expect("cookie cleared");
    assert!(cleared.contains("Max-Age=0"));
    let body = body_json(response).await;
    assert_eq!(body["data"]["success"], true);

    // Refresh with the pre-logout token fails
    let response = app
        .clone()
        .oneshot(session_request("/api/auth/refresh", None, Some(&refresh)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The guard also refuses the old pair: the stored hash is gone
    let response = app
        .oneshot(session_request("/api/users/test", Some(&access), Some(&refresh)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "invalid or expired session");
}

#[tokio::test]
async fn test_guard_rejections_over_http() {
    let app = test_app();
    let (alice_access, alice_refresh) = register(&app, "a@x.com", "secret1").await;
    let (_, bob_refresh) = register(&app, "b@x.com", "secret1").await;

    let cases = [
        (None, Some(alice_refresh.as_str()), "authentication required"),
        (Some("not.a.jwt"), Some(alice_refresh.as_str()), "invalid access token"),
        (Some(alice_access.as_str()), None, "session expired"),
        (
            Some(alice_access.as_str()),
            Some(bob_refresh.as_str()),
            "invalid or expired session",
        ),
    ];

    for (access, refresh, message) in cases {
        let response = app
            .clone()
            .oneshot(session_request("/api/users/test", access, refresh))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", message);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], message);
    }
}

#[tokio::test]
async fn test_store_failure_hides_details() {
    let app = app_with_store(Arc::new(UnavailableStore));

    for path in ["/api/auth/login", "/api/auth/register"] {
        let response = app
            .clone()
            .oneshot(json_request(
                path,
                json!({ "email": "a@x.com", "password": "secret1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", path);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("secret-detail"), "{}", path);

        let body: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "internal server error");
    }
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "healthy");
}
