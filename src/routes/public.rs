use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable by anyone. None of them is guarded: pages read the
/// identity cookie only to decide what to show, never to refuse.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET / and GET /login
        // Page data for the landing and sign-in pages (the redirect targets of both guards).
        .route("/", get(handlers::home_page))
        .route("/login", get(handlers::sign_in_page))
        // GET /api/session
        // The decoded identity cookie, for client code that cannot read it directly.
        .route("/api/session", get(handlers::get_session))
        // POST /api/auth/logout
        // Expires both session cookies locally; the backend keeps no session to end.
        .route("/api/auth/logout", post(handlers::sign_out))
}
