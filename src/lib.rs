use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span, field};

// --- Module Structure ---

// Identity, guards and cookie handling.
pub mod auth;
pub mod cookies;
pub mod gatekeeper;
pub mod layout;

// Proxy surface and its backend seam.
pub mod backend;
pub mod proxy;
pub mod validation;

// Shared pieces.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

// Client-side state containers that consume the proxy surface.
pub mod client;

// Module for routing segregation (Public, Protected pages, API proxy).
pub mod routes;
use routes::{api, manage, public};

// --- Public Re-exports ---

pub use auth::{Identity, IdentityClaim, Role};
pub use backend::{BackendState, HttpBackend, MockBackend};
pub use config::AppConfig;

/// Correlation header set on every request and echoed on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ApiDoc
///
/// OpenAPI document for the endpoints the gateway answers itself, plus the
/// schemas shared with the front end. Proxied routes mirror the backend's own
/// contract and are not repeated here. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_session, handlers::sign_out, handlers::home_page,
        handlers::sign_in_page, layout::manage_shell
    ),
    components(
        schemas(
            models::MessageBody, models::NavItem, models::LayoutShell,
            models::SessionView, models::PublicPage, models::PageMeta, auth::Role,
        )
    ),
    tags(
        (name = "court-gateway", description = "Court booking web gateway")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for the gateway's services and configuration.
#[derive(Clone)]
pub struct AppState {
    /// Backend Layer: the client every proxy handler forwards through.
    pub backend: BackendState,
    /// Configuration: backend origin, cookie attributes, environment.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for BackendState {
    fn from_ref(app_state: &AppState) -> BackendState {
        app_state.backend.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the gateway's routing structure, applies global and scoped
/// middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public pages and gateway-owned endpoints: no guard.
        .merge(public::public_routes())
        // Protected pages: gatekeeper middleware scoped to these routes only.
        .merge(manage::manage_routes())
        // Proxy surface: the backend decides authorization from the bearer token.
        .merge(api::api_routes(api::proxy_table()))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Surface
///
/// Which part of the gateway a path belongs to. Recorded on every request span
/// so logs can be filtered by guard class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// `/manage` and below: gatekeeper plus layout guard.
    Manage,
    /// `/api/*`: the proxy table and the gateway-owned session endpoints.
    Api,
    /// Swagger UI and the OpenAPI document.
    Docs,
    /// Everything else: home, sign-in, health.
    Public,
}

impl Surface {
    pub fn of(path: &str) -> Surface {
        let path = gatekeeper::canonical_path(path);
        if gatekeeper::is_under(&path, gatekeeper::PROTECTED_PREFIX) {
            Surface::Manage
        } else if gatekeeper::is_under(&path, "/api") {
            Surface::Api
        } else if gatekeeper::is_under(&path, "/swagger-ui") || gatekeeper::is_under(&path, "/api-docs") {
            Surface::Docs
        } else {
            Surface::Public
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Manage => "manage",
            Surface::Api => "api",
            Surface::Docs => "docs",
            Surface::Public => "public",
        }
    }
}

/// trace_span_logger
///
/// Builds the per-request span. Besides method, path and `x-request-id` it
/// carries the gateway surface, and leaves two fields for the handlers to fill:
/// `role` (recorded by the gatekeeper) and `proxy_route` (recorded by the proxy
/// with the matched table entry).
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");
    let path = request.uri().path();

    tracing::info_span!(
        "gateway_request",
        method = %request.method(),
        path = %path,
        surface = Surface::of(path).as_str(),
        req_id = %request_id,
        role = field::Empty,
        proxy_route = field::Empty,
    )
}
