use crate::{AppState, gatekeeper, layout};
use axum::{Router, middleware, routing::get};

/// Back-office Router Module
///
/// Every page of the protected section. Two independent checks run per request:
/// the gatekeeper middleware (edge decision table, including role-exclusive
/// subtrees) and the layout guard inside the handler (render-time re-check).
///
/// `route_layer` scopes the gatekeeper to these routes, so it is skipped for
/// every other path instead of being evaluated and allowing them through.
pub fn manage_routes() -> Router<AppState> {
    Router::new()
        // GET /manage
        // Dashboard, shared by ADMIN and OWNER.
        .route("/manage", get(layout::manage_shell))
        // GET /manage/{*section}
        // Every sub-page: users, fields, ads, subscriptions, sport types, and anything below them.
        .route("/manage/{*section}", get(layout::manage_shell))
        .route_layer(middleware::from_fn(gatekeeper::gatekeeper))
}
