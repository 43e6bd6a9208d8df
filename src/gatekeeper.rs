use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use tracing::Span;

use crate::auth::{Identity, Role};

// --- Path Configuration ---

/// Root of the back-office. Everything at or below it requires a non-CLIENT identity.
pub const PROTECTED_PREFIX: &str = "/manage";
/// Where anonymous visitors are sent.
pub const SIGN_IN_PATH: &str = "/login";
/// Where CLIENT accounts are sent.
pub const HOME_PATH: &str = "/";

/// Subtrees only ADMIN may enter.
pub const ADMIN_ONLY: [&str; 3] = ["/manage/users", "/manage/subscriptions", "/manage/sport-types"];
/// Subtrees only OWNER may enter.
pub const OWNER_ONLY: [&str; 1] = ["/manage/fields"];

/// GateDecision
///
/// The outcome of the edge check: let the request through, or redirect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
}

/// is_under
///
/// Segment-aware prefix test: `/manage/users/7` is under `/manage/users`,
/// `/manage/usersX` is not.
pub fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// canonical_path
///
/// The path the router effectively serves: percent-decoded (repeatedly, so
/// double encoding cannot hide a segment), with empty and `.` segments dropped
/// and `..` resolved. `/manage//users`, `/manage/%75sers` and
/// `/manage/./users` all become `/manage/users`.
pub fn canonical_path(raw: &str) -> String {
    let mut decoded = raw.to_string();
    for _ in 0..4 {
        let next = String::from_utf8_lossy(&urlencoding::decode_binary(decoded.as_bytes())).into_owned();
        if next == decoded {
            break;
        }
        decoded = next;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

/// decide
///
/// The gatekeeper's decision table. Pure: the caller supplies the path and the
/// already-decoded identity. Rules are evaluated in order and the first match wins.
pub fn decide(path: &str, identity: &Identity) -> GateDecision {
    let protected = is_under(path, PROTECTED_PREFIX);
    let role = identity.role();

    // 1. Anonymous visitors must sign in first.
    if protected && role.is_none() {
        return GateDecision::Redirect(SIGN_IN_PATH);
    }

    // 2. Customers have no back-office at all.
    if protected && role == Some(Role::Client) {
        return GateDecision::Redirect(HOME_PATH);
    }

    // 3. and 4. Role-exclusive subtrees bounce back to the section root.
    if ADMIN_ONLY.iter().any(|prefix| is_under(path, prefix)) && role != Some(Role::Admin) {
        return GateDecision::Redirect(PROTECTED_PREFIX);
    }
    if OWNER_ONLY.iter().any(|prefix| is_under(path, prefix)) && role != Some(Role::Owner) {
        return GateDecision::Redirect(PROTECTED_PREFIX);
    }

    GateDecision::Allow
}

/// gatekeeper
///
/// Middleware installed with `route_layer` on the protected routes only, so it
/// never executes for any other path. Reads the identity cookie through the
/// `Identity` extractor and either redirects (307) or hands the request on.
/// The table is evaluated on `canonical_path`, never on the raw URI.
pub async fn gatekeeper(identity: Identity, request: Request, next: Next) -> Response {
    let path = canonical_path(request.uri().path());
    Span::current().record("role", identity.role().map(|role| role.as_str()));

    match decide(&path, &identity) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Redirect(target) => {
            tracing::info!(
                path = %path,
                role = ?identity.role(),
                to = target,
                "gatekeeper redirect"
            );
            Redirect::temporary(target).into_response()
        }
    }
}
