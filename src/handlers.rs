use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::{
    auth::Identity,
    config::AppConfig,
    cookies,
    models::{MessageBody, PublicPage, SessionView},
};

// --- Handlers owned by the gateway (everything else is proxied) ---

/// get_session
///
/// [Public Route] Returns the decoded identity cookie so client code can render
/// user state. An unusable cookie reads as signed out.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current session", body = SessionView))
)]
pub async fn get_session(identity: Identity) -> Json<SessionView> {
    Json(identity.session_view())
}

/// sign_out
///
/// [Public Route] Expires both session cookies. Works whether or not a session exists.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Signed out", body = MessageBody))
)]
pub async fn sign_out(identity: Identity, State(config): State<AppConfig>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    cookies::clear_session_cookies(&mut headers, &config);
    tracing::info!(role = ?identity.role(), "session cleared");

    (StatusCode::OK, headers, Json(MessageBody::new("Signed out")))
}

/// home_page
///
/// [Public Route] Data for the landing page header.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Home page data", body = PublicPage))
)]
pub async fn home_page(identity: Identity) -> Json<PublicPage> {
    Json(public_page("home", &identity))
}

/// sign_in_page
///
/// [Public Route] Data for the sign-in page.
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Sign-in page data", body = PublicPage))
)]
pub async fn sign_in_page(identity: Identity) -> Json<PublicPage> {
    Json(public_page("login", &identity))
}

fn public_page(page: &str, identity: &Identity) -> PublicPage {
    PublicPage {
        page: page.to_string(),
        user: identity.claim().map(|_| identity.session_view()),
    }
}
