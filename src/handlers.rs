use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    auth::{AuthSession, expired_session_cookie, session_cookie},
    config::AppConfig,
    errors::ApiError,
    models::{LoginRequest, LoginResponse, Role, SessionView, UpdateSessionRequest},
};

/// health
///
/// Liveness probe for load balancers. Outside the gate.
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> &'static str {
    "ok"
}

/// login
///
/// Exchanges credentials with the backend and issues a session. The token is
/// returned both in the body (for API clients) and as an HttpOnly cookie (for
/// the browser, where the gate picks it up).
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Credentials rejected by the backend"),
        (status = 403, description = "Account has no role"),
        (status = 502, description = "Backend unavailable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .backend
        .authenticate(&payload)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

    let token = state.tokens.issue(&user)?;
    tracing::info!(subject = %user.id, "Session issued");

    session_response(&state, token)
}

/// get_session
///
/// Returns the caller's session. 401 when the request is anonymous.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session", body = SessionView),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_session(session: AuthSession) -> Result<Json<SessionView>, ApiError> {
    session
        .claims
        .view()
        .map(Json)
        .ok_or_else(|| ApiError::Unauthorized("incomplete session".to_string()))
}

/// update_session
///
/// Re-issues the session after a server-side profile change (typically the
/// end of candidate onboarding). The flag is re-read from the backend when the
/// session carries a backend token; otherwise the request body supplies it.
#[utoipa::path(
    post,
    path = "/api/auth/session/update",
    request_body(content = UpdateSessionRequest, description = "Used only without a backend token"),
    responses(
        (status = 200, description = "Session re-issued", body = LoginResponse),
        (status = 400, description = "Nothing to merge"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn update_session(
    State(state): State<AppState>,
    AuthSession { mut claims, .. }: AuthSession,
    body: Bytes,
) -> Result<Response, ApiError> {
    let profile_complete = match claims.access_token.clone() {
        Some(access_token) => {
            let user = state.backend.current_user(&access_token).await?;
            if let Some(role) = user.role.as_deref().filter(|role| !role.is_empty()) {
                claims.role = Some(Role::from_name(role));
            }
            if user.name.is_some() {
                claims.name = user.name;
            }
            user.profile_complete
        }
        None => requested_profile(&body)?.ok_or_else(|| {
            ApiError::BadRequest("profile_complete is required for this session".to_string())
        })?,
    };

    tracing::info!(subject = ?claims.sub, profile_complete, "Session updated");
    let token = state.tokens.update(claims, profile_complete)?;

    session_response(&state, token)
}

/// logout
///
/// Destroys the session cookie. Idempotent; works without a session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Session cookie cleared"))
)]
pub async fn logout(State(config): State<AppConfig>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, expired_session_cookie(&config))],
    )
}

fn requested_profile(body: &[u8]) -> Result<Option<bool>, ApiError> {
    if body.is_empty() {
        return Ok(None);
    }

    let requested: UpdateSessionRequest =
        serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(requested.profile_complete)
}

fn session_response(state: &AppState, token: String) -> Result<Response, ApiError> {
    let session = state
        .tokens
        .verify(&token)?
        .view()
        .ok_or_else(|| ApiError::Unauthorized("incomplete session".to_string()))?;

    let cookie = session_cookie(&state.config, &token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse { token, session }),
    )
        .into_response())
}
