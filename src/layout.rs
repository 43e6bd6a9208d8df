use axum::{
    Json,
    http::Uri,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    auth::{Identity, Role},
    gatekeeper::{HOME_PATH, SIGN_IN_PATH, canonical_path},
    models::{LayoutShell, NavItem},
};

/// LayoutDecision
///
/// Result of the render-time guard: either the shell to render or where to go instead.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutDecision {
    Render(LayoutShell),
    Redirect(&'static str),
}

fn item(label: &str, href: &str) -> NavItem {
    NavItem {
        label: label.to_string(),
        href: href.to_string(),
    }
}

/// navigation_for
///
/// The fixed menu for each back-office role. CLIENT has no back-office menu.
pub fn navigation_for(role: Role) -> Vec<NavItem> {
    match role {
        Role::Admin => vec![
            item("Dashboard", "/manage"),
            item("Users", "/manage/users"),
            item("Advertisements", "/manage/ads"),
            item("Subscriptions", "/manage/subscriptions"),
            item("Sport types", "/manage/sport-types"),
        ],
        Role::Owner => vec![
            item("Dashboard", "/manage"),
            item("Fields", "/manage/fields"),
            item("Advertisements", "/manage/ads"),
        ],
        Role::Client => Vec::new(),
    }
}

/// guard_layout
///
/// Re-derives access from the identity on every render, independently of the
/// gatekeeper that ran before it.
pub fn guard_layout(identity: &Identity, path: &str) -> LayoutDecision {
    let Some(claim) = identity.claim() else {
        return LayoutDecision::Redirect(SIGN_IN_PATH);
    };

    match claim.role() {
        Role::Client => LayoutDecision::Redirect(HOME_PATH),
        role => LayoutDecision::Render(LayoutShell {
            username: claim.username(),
            role,
            path: path.to_string(),
            nav: navigation_for(role),
        }),
    }
}

/// manage_shell
///
/// [Protected Route] Renders the back-office shell for any page under `/manage`.
#[utoipa::path(
    get,
    path = "/manage",
    responses(
        (status = 200, description = "Shell for the signed-in back-office user", body = LayoutShell),
        (status = 307, description = "Redirect to sign-in or home")
    )
)]
pub async fn manage_shell(identity: Identity, uri: Uri) -> Response {
    let path = canonical_path(uri.path());
    match guard_layout(&identity, &path) {
        LayoutDecision::Render(shell) => Json(shell).into_response(),
        LayoutDecision::Redirect(target) => {
            tracing::info!(path = %path, to = target, "layout guard redirect");
            Redirect::temporary(target).into_response()
        }
    }
}
