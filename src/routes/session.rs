use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Session Router Module
///
/// The JSON endpoints that manage the session lifecycle.
/// Nested under `/api/auth`.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // POST /api/auth/login
        // Credential exchange against the backend; sets the session cookie.
        .route("/login", post(handlers::login))
        // GET /api/auth/session
        // The caller's current session, as the front end sees it.
        .route("/session", get(handlers::get_session))
        // POST /api/auth/session/update
        // Re-issues the token after a profile change (end of onboarding).
        .route("/session/update", post(handlers::update_session))
        // POST /api/auth/logout
        // Clears the session cookie.
        .route("/logout", post(handlers::logout))
}
