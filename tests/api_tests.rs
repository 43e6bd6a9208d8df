use axum::{
    Json, Router,
    extract::RawQuery,
    http::{HeaderMap, Method, StatusCode, header},
    routing::{get, patch, post},
};
use court_gateway::{
    AppConfig, AppState, HttpBackend, create_router,
    client::{ApiTransport, GatewayClient, ListQuery, Store},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

// --- Test Harness ---
//
// Spins up a stand-in booking backend and the real gateway on ephemeral ports,
// then talks to the gateway over HTTP like a browser would.

/// Returns the base URL of a served router.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn bearer(headers: &HeaderMap) -> Value {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| Value::String(value.to_string()))
        .unwrap_or(Value::Null)
}

fn fake_backend() -> Router {
    Router::new()
        .route(
            "/auth/login",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == "secret" {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "accessToken": "jwt-123",
                            "user": { "id": 1, "name": "Ana", "role": "OWNER" }
                        })),
                    )
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "message": ["email or password", "is incorrect"] })),
                    )
                }
            }),
        )
        .route(
            "/courts",
            get(|headers: HeaderMap, RawQuery(query): RawQuery| async move {
                Json(json!({
                    "data": [
                        { "_id": "c1", "name": "Center", "imgUrls": [] },
                        { "_id": "c2", "name": "North", "imgUrls": [] }
                    ],
                    "meta": { "page": 1, "limit": 10, "total": 2, "totalPages": 1 },
                    "seenAuth": bearer(&headers),
                    "seenQuery": query,
                }))
            }),
        )
        .route(
            "/advertisements/{id}/home",
            patch(|Json(body): Json<Value>| async move {
                Json(json!({ "data": { "id": "ad1", "title": "Promo", "isHome": body["isHome"] } }))
            }),
        )
        .route(
            "/advertisements",
            get(|| async {
                Json(json!([{ "id": "ad1", "title": "Promo", "isHome": false, "priority": 1 }]))
            }),
        )
        .route(
            "/dashboard/reports",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "reports offline") }),
        )
}

async fn start() -> String {
    let backend_url = serve(fake_backend()).await;
    let state = AppState {
        backend: Arc::new(HttpBackend::new(&backend_url)),
        config: AppConfig::default(),
    };
    serve(create_router(state)).await
}

fn no_redirects() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

// --- End-to-end flows ---

#[tokio::test]
async fn test_sign_in_then_browse_the_back_office() {
    let gateway = start().await;
    let http = no_redirects();

    // 1. Sign in through the proxy.
    let login = http
        .post(format!("{gateway}/api/auth/login"))
        .json(&json!({ "email": "ana@x.io", "password": "secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    let cookie_header = login
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .collect::<Vec<_>>()
        .join("; ");
    assert!(cookie_header.contains("access_token=jwt-123"));
    assert!(cookie_header.contains("user="));

    let body: Value = login.json().await.unwrap();
    assert!(body.get("accessToken").is_none());

    // 2. The owner may open fields; the gatekeeper bounces them from users.
    let fields = http
        .get(format!("{gateway}/manage/fields"))
        .header(header::COOKIE, &cookie_header)
        .send()
        .await
        .unwrap();
    assert_eq!(fields.status(), StatusCode::OK);
    let shell: Value = fields.json().await.unwrap();
    assert_eq!(shell["role"], "OWNER");
    assert_eq!(shell["username"], "Ana");

    let users = http
        .get(format!("{gateway}/manage/users"))
        .header(header::COOKIE, &cookie_header)
        .send()
        .await
        .unwrap();
    assert_eq!(users.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(users.headers().get(header::LOCATION).unwrap(), "/manage");

    // 3. Proxied reads carry the bearer token and the query string.
    let courts: Value = http
        .get(format!("{gateway}/api/courts?page=1&limit=10"))
        .header(header::COOKIE, &cookie_header)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(courts["seenAuth"], "Bearer jwt-123");
    assert_eq!(courts["seenQuery"], "page=1&limit=10");
}

#[tokio::test]
async fn test_anonymous_visitor_is_sent_to_login() {
    let gateway = start().await;

    let response = no_redirects()
        .get(format!("{gateway}/manage"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unreachable_backend_yields_500() {
    // Bind and drop a listener so the port is known to be closed.
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let gateway = serve(create_router(AppState {
        backend: Arc::new(HttpBackend::new(&closed)),
        config: AppConfig::default(),
    }))
    .await;

    let response = reqwest::get(format!("{gateway}/api/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert!(!body["message"].as_str().unwrap().is_empty());
}

// --- Client slices against the running gateway ---

#[tokio::test]
async fn test_store_slices_over_http() {
    let gateway = start().await;
    let store = Store::new(Arc::new(GatewayClient::new(&gateway).with_cookie("access_token=jwt-123")));

    store.courts.fetch_list(&ListQuery { page: Some(1), limit: Some(10), search: None }).await;
    let courts = store.courts.snapshot().await;
    assert_eq!(courts.error, None);
    assert!(!courts.loading);
    assert_eq!(courts.items.len(), 2);
    assert_eq!(courts.items[0].id, "c1");
    assert_eq!(courts.meta.unwrap().total, 2);

    store.advertisements.fetch_list(&ListQuery::default()).await;
    store.advertisements.toggle_home("ad1").await;
    let ads = store.advertisements.snapshot().await;
    assert_eq!(ads.error, None);
    assert!(ads.items[0].is_home);

    store.dashboard.fetch(&[]).await;
    let dashboard = store.dashboard.snapshot().await;
    assert_eq!(dashboard.report, None);
    assert_eq!(dashboard.error.as_deref(), Some("reports offline"));
}

#[tokio::test]
async fn test_backend_error_message_reaches_the_client() {
    let gateway = start().await;
    let client = GatewayClient::new(&gateway);
    let failure = client
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ana@x.io", "password": "wrong" })),
        )
        .await
        .unwrap_err();

    assert_eq!(failure.status, Some(StatusCode::UNAUTHORIZED));
    assert_eq!(failure.message, "email or password, is incorrect");

    // A failed sign-in leaves no session behind.
    let session: Value = reqwest::get(format!("{gateway}/api/session"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["authenticated"], false);
}
