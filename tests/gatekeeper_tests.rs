use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use court_gateway::{
    AppConfig, AppState, Identity, IdentityClaim, MockBackend, Role, Surface, create_router,
    gatekeeper::{
        GateDecision, HOME_PATH, PROTECTED_PREFIX, SIGN_IN_PATH, canonical_path, decide, is_under,
    },
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

// --- Helper Functions ---

fn identity(role: Role) -> Identity {
    let fields = json!({ "id": "1", "name": "Tester", "role": role.as_str() });
    let serde_json::Value::Object(fields) = fields else {
        unreachable!()
    };
    Identity::Authenticated(IdentityClaim::from_fields(fields).unwrap())
}

fn identity_cookie(role: Role) -> String {
    match identity(role) {
        Identity::Authenticated(claim) => format!("user={}", claim.encode()),
        Identity::Anonymous => unreachable!(),
    }
}

fn test_app() -> axum::Router {
    create_router(AppState {
        backend: Arc::new(MockBackend::responding(StatusCode::OK, "{}")),
        config: AppConfig::default(),
    })
}

async fn get(path: &str, cookie: Option<String>) -> axum::response::Response {
    let mut request = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    test_app()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

const PROTECTED_PATHS: [&str; 8] = [
    "/manage",
    "/manage/users",
    "/manage/users/42",
    "/manage/fields",
    "/manage/fields/new",
    "/manage/ads",
    "/manage/subscriptions",
    "/manage/sport-types",
];

const ADMIN_ONLY_PATHS: [&str; 4] = [
    "/manage/users",
    "/manage/users/42/edit",
    "/manage/subscriptions",
    "/manage/sport-types",
];

const OWNER_ONLY_PATHS: [&str; 2] = ["/manage/fields", "/manage/fields/7"];

// --- Decision table (pure) ---

#[test]
fn test_unprotected_paths_always_allow() {
    let everyone = [
        Identity::Anonymous,
        identity(Role::Admin),
        identity(Role::Owner),
        identity(Role::Client),
    ];
    for path in ["/", "/login", "/courts", "/managers", "/api/users", "/manager/users"] {
        for who in &everyone {
            assert_eq!(decide(path, who), GateDecision::Allow, "path = {path}");
        }
    }
}

#[test]
fn test_anonymous_is_sent_to_sign_in() {
    for path in PROTECTED_PATHS {
        assert_eq!(
            decide(path, &Identity::Anonymous),
            GateDecision::Redirect(SIGN_IN_PATH),
            "path = {path}"
        );
    }
}

#[test]
fn test_client_is_sent_home_never_to_sign_in() {
    for path in PROTECTED_PATHS {
        assert_eq!(
            decide(path, &identity(Role::Client)),
            GateDecision::Redirect(HOME_PATH),
            "path = {path}"
        );
    }
}

#[test]
fn test_admin_only_subtrees() {
    for path in ADMIN_ONLY_PATHS {
        assert_eq!(decide(path, &identity(Role::Admin)), GateDecision::Allow);
        assert_eq!(
            decide(path, &identity(Role::Owner)),
            GateDecision::Redirect(PROTECTED_PREFIX)
        );
    }
}

#[test]
fn test_owner_only_subtrees() {
    for path in OWNER_ONLY_PATHS {
        assert_eq!(decide(path, &identity(Role::Owner)), GateDecision::Allow);
        assert_eq!(
            decide(path, &identity(Role::Admin)),
            GateDecision::Redirect(PROTECTED_PREFIX)
        );
    }
}

#[test]
fn test_shared_subtrees_admit_both_back_office_roles() {
    for path in ["/manage", "/manage/ads", "/manage/ads/3"] {
        assert_eq!(decide(path, &identity(Role::Admin)), GateDecision::Allow);
        assert_eq!(decide(path, &identity(Role::Owner)), GateDecision::Allow);
    }
}

#[test]
fn test_prefix_match_is_segment_aware() {
    assert!(is_under("/manage", "/manage"));
    assert!(is_under("/manage/users/1", "/manage/users"));
    assert!(!is_under("/managers", "/manage"));
    assert!(!is_under("/manage/users-archive", "/manage/users"));
}

#[test]
fn test_canonical_path_normalises_equivalent_spellings() {
    for raw in [
        "/manage/users",
        "/manage//users",
        "/manage/%75sers",
        "/manage/./users",
        "/manage/users/",
        "/manage/fields/../users",
        "/manage/%2575sers",
        "//manage///users",
    ] {
        assert_eq!(canonical_path(raw), "/manage/users", "raw = {raw}");
    }
    assert_eq!(canonical_path("/"), "/");
    assert_eq!(canonical_path("/../.."), "/");
    assert_eq!(canonical_path("/manage/.."), "/");
}

#[test]
fn test_request_surface_classification() {
    assert_eq!(Surface::of("/manage"), Surface::Manage);
    assert_eq!(Surface::of("/manage//users"), Surface::Manage);
    assert_eq!(Surface::of("/api/courts/1"), Surface::Api);
    assert_eq!(Surface::of("/api/session"), Surface::Api);
    assert_eq!(Surface::of("/api-docs/openapi.json"), Surface::Docs);
    assert_eq!(Surface::of("/swagger-ui/index.html"), Surface::Docs);
    assert_eq!(Surface::of("/managers"), Surface::Public);
    assert_eq!(Surface::of("/login").as_str(), "public");
}

// --- Middleware through the router ---

#[tokio::test]
async fn test_manage_users_without_cookie_redirects_to_login() {
    let response = get("/manage/users", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_admin_on_fields_redirects_to_manage() {
    let response = get("/manage/fields", Some(identity_cookie(Role::Admin))).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/manage"));
}

#[tokio::test]
async fn test_owner_on_ads_passes_through() {
    let response = get("/manage/ads", Some(identity_cookie(Role::Owner))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(location(&response), None);
}

#[tokio::test]
async fn test_client_is_redirected_home_by_middleware() {
    let response = get("/manage", Some(identity_cookie(Role::Client))).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_malformed_cookie_fails_closed() {
    let response = get("/manage", Some("user=%7Bbroken".to_string())).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_public_pages_ignore_cookies() {
    for cookie in [None, Some(identity_cookie(Role::Client)), Some("user=garbage".to_string())] {
        let response = get("/login", cookie).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(location(&response), None);
    }
}

#[tokio::test]
async fn test_owner_cannot_reach_admin_subtree_through_alternate_spellings() {
    for path in [
        "/manage//users",
        "/manage/%75sers",
        "/manage/./users",
        "/manage/fields/../users",
        "/manage/%2575sers",
        "/manage/sport-types/",
    ] {
        let response = get(path, Some(identity_cookie(Role::Owner))).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "path = {path}");
        assert_eq!(location(&response), Some("/manage"), "path = {path}");
    }
}

#[tokio::test]
async fn test_admin_cannot_reach_owner_subtree_through_alternate_spellings() {
    for path in ["/manage//fields", "/manage/%66ields/3", "/manage/./fields"] {
        let response = get(path, Some(identity_cookie(Role::Admin))).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "path = {path}");
        assert_eq!(location(&response), Some("/manage"), "path = {path}");
    }
}
