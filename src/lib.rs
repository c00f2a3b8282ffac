use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod backend;
pub mod config;
pub mod errors;
pub mod gate;
pub mod handlers;
pub mod models;

// Routing split by how the gate treats each surface.
pub mod routes;
use routes::{pages, public, session};

// --- Public Re-exports ---

pub use auth::SessionTokens;
pub use backend::{AuthBackend, BackendState, HttpAuthBackend};
pub use config::AppConfig;
pub use gate::table::GateConfig;

/// ApiDoc
///
/// OpenAPI document for the session API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::login, handlers::get_session,
        handlers::update_session, handlers::logout
    ),
    components(
        schemas(
            models::Role, models::LoginRequest, models::LoginResponse,
            models::SessionView, models::UpdateSessionRequest,
        )
    ),
    tags(
        (name = "portal-gate", description = "Recruitment portal session and access gate")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state of every request. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    /// Backend REST client (credential exchange, profile lookup).
    pub backend: BackendState,
    /// Signs and verifies session tokens.
    pub tokens: SessionTokens,
    /// Route classification tables and transport exclusions. Read-only.
    pub gate: Arc<GateConfig>,
    /// Runtime configuration (cookie name, secrets, backend URL, page bundle).
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, gate: GateConfig, backend: BackendState) -> Self {
        Self {
            backend,
            tokens: SessionTokens::from_config(&config),
            gate: Arc::new(gate),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for BackendState {
    fn from_ref(app_state: &AppState) -> BackendState {
        app_state.backend.clone()
    }
}

impl FromRef<AppState> for SessionTokens {
    fn from_ref(app_state: &AppState) -> SessionTokens {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the access gate and the
/// observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .nest("/api/auth", session::session_routes())
        // Pages: everything else is the front-end bundle.
        .fallback_service(pages::page_service(&state.config.public_dir))
        // The gate wraps every route; its exclusion list lets API, health,
        // docs and asset requests through untouched.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::middleware::access_gate,
        ))
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation.
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                // 3b. Request Tracing, correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span: method, URI and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
