use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState, auth::session_credential, models::ResolvedSession, routes::pages::APP_SHELL,
};

use super::{Decision, GateRequest, canonical_path, evaluate};

/// access_gate
///
/// Middleware wrapping every page request. The path is canonicalized first so
/// the tables see what the page service will serve. Excluded paths pass
/// straight through; everything else has its session resolved (failures count
/// as anonymous) and is either forwarded or answered with a 307 redirect before
/// any page is served. Never produces an error response of its own.
pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = canonical_path(request.uri().path());
    let exclusions = &state.gate.exclusions;

    if exclusions.excludes_path(&path) {
        return next.run(request).await;
    }

    let session = session_credential(request.headers(), &state.config.session_cookie)
        .map(|token| state.tokens.resolve(token))
        .unwrap_or(ResolvedSession::Anonymous);

    let gate_request = GateRequest::new(&path, &session).with_query(request.uri().query());
    let verdict = evaluate(&gate_request, &state.gate.routes);
    let prefetch = exclusions.is_prefetch(request.headers());

    tracing::debug!(
        path = %path,
        role = session.role().map(|role| role.as_str()).unwrap_or("anonymous"),
        rule = verdict.rule,
        decision = ?verdict.decision,
        prefetch,
        "Gate decision"
    );

    match verdict.decision {
        Decision::Proceed => next.run(request).await,
        // Prefetches are never redirected, and never handed the gated page.
        Decision::Redirect(_) if prefetch => {
            *request.uri_mut() = Uri::from_static(APP_SHELL);
            next.run(request).await
        }
        Decision::Redirect(target) => Redirect::temporary(&target).into_response(),
    }
}
