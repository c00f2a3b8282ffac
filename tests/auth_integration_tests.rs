use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use portal_gate::{
    AppState, GateConfig,
    auth::{AuthSession, Claims},
    backend::{AuthBackend, BackendError},
    config::AppConfig,
    models::{BackendUser, LoginRequest, Role},
};
use std::{sync::Arc, time::SystemTime};

// --- Mock Backend for Auth Logic ---

#[derive(Default)]
struct NoBackend;

#[async_trait]
impl AuthBackend for NoBackend {
    async fn authenticate(&self, _credentials: &LoginRequest) -> Result<BackendUser, BackendError> {
        Err(BackendError::Status(503))
    }
    async fn current_user(&self, _access_token: &str) -> Result<BackendUser, BackendError> {
        Err(BackendError::Status(503))
    }
}

// --- Helper Functions ---

const TEST_SECRET: &str = "test-secret-value-1234567890";

fn now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn create_token(sub: Option<&str>, role: Option<Role>, exp_offset: i64, secret: &str) -> String {
    let now = now();
    let claims = Claims {
        sub: sub.map(str::to_string),
        role,
        profile_complete: true,
        name: Some("Test User".to_string()),
        email: Some("test@example.com".to_string()),
        access_token: None,
        iat: now,
        exp: now + exp_offset,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state() -> AppState {
    let config = AppConfig {
        session_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(config, GateConfig::default(), Arc::new(NoBackend))
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/api/auth/session".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    parts
}

async fn rejection_status(parts: &mut Parts, state: &AppState) -> StatusCode {
    match AuthSession::from_request_parts(parts, state).await {
        Ok(session) => panic!("expected rejection, got session for {}", session.subject),
        Err(e) => e.into_response().status(),
    }
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_bearer() {
    let state = create_app_state();
    let token = create_token(Some("mgr-1"), Some(Role::Manager), 3600, TEST_SECRET);
    let mut parts = with_bearer(&token);

    let session = AuthSession::from_request_parts(&mut parts, &state)
        .await
        .unwrap();

    assert_eq!(session.subject, "mgr-1");
    assert_eq!(session.role, Role::Manager);
    assert_eq!(session.claims.email.as_deref(), Some("test@example.com"));
}

#[tokio::test]
async fn test_auth_success_with_session_cookie() {
    let state = create_app_state();
    let token = create_token(Some("hr-1"), Some(Role::Hr), 3600, TEST_SECRET);

    let mut parts = get_request_parts(Method::GET, "/api/auth/session".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("theme=dark; portal_session={}", token)).unwrap(),
    );

    let session = AuthSession::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(session.role, Role::Hr);
}

#[tokio::test]
async fn test_auth_failure_with_missing_credential() {
    let state = create_app_state();
    let mut parts = get_request_parts(Method::GET, "/api/auth/session".parse().unwrap());

    assert_eq!(
        rejection_status(&mut parts, &state).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    let state = create_app_state();
    // Well past the decoder's clock-skew leeway.
    let token = create_token(Some("mgr-1"), Some(Role::Manager), -3600, TEST_SECRET);
    let mut parts = with_bearer(&token);

    assert_eq!(
        rejection_status(&mut parts, &state).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let state = create_app_state();
    let token = create_token(Some("adm-1"), Some(Role::Admin), 3600, "some-other-secret");
    let mut parts = with_bearer(&token);

    assert_eq!(
        rejection_status(&mut parts, &state).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_auth_failure_with_partial_claims() {
    let state = create_app_state();

    let no_role = create_token(Some("u-1"), None, 3600, TEST_SECRET);
    assert_eq!(
        rejection_status(&mut with_bearer(&no_role), &state).await,
        StatusCode::UNAUTHORIZED
    );

    let no_subject = create_token(None, Some(Role::Candidate), 3600, TEST_SECRET);
    assert_eq!(
        rejection_status(&mut with_bearer(&no_subject), &state).await,
        StatusCode::UNAUTHORIZED
    );
}
