use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tracing::Span;

use crate::{
    auth::{self, IdentityClaim},
    backend::{Backend, BackendRequest},
    config::AppConfig,
    cookies,
    error::GatewayError,
    validation::Validator,
};

/// Body keys the backend may use for the access token in a sign-in response.
const TOKEN_KEYS: [&str; 3] = ["accessToken", "access_token", "token"];

/// Profile fields whose presence marks a top-level object as a user record.
const USER_MARKERS: [&str; 3] = ["role", "name", "email"];

/// ResponseHook
///
/// A side effect applied after a successful (2xx, JSON) backend response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseHook {
    /// Sign-in: store the token and identity cookies, strip the token from the body.
    StartSession,
    /// Profile update: merge the returned user fields into the identity cookie.
    RefreshIdentity,
}

/// ProxyRoute
///
/// One entry of the proxy surface. The same forwarding algorithm serves every
/// entry; routes differ only in paths, accepted methods, validators and hooks.
#[derive(Clone)]
pub struct ProxyRoute {
    /// Path on this gateway, in axum syntax (`/api/courts/{id}`).
    pub path: &'static str,
    /// Path template on the backend; `{name}` placeholders take the gateway's path params.
    pub backend_path: &'static str,
    methods: Vec<Method>,
    validators: Vec<(Method, Validator)>,
    hooks: Vec<(Method, ResponseHook)>,
}

impl ProxyRoute {
    pub fn new(path: &'static str, backend_path: &'static str, methods: &[Method]) -> Self {
        Self {
            path,
            backend_path,
            methods: methods.to_vec(),
            validators: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Runs `validator` on the JSON body of `method` requests before forwarding.
    pub fn validate(mut self, method: Method, validator: Validator) -> Self {
        self.validators.push((method, validator));
        self
    }

    /// Applies `hook` to successful responses of `method` requests.
    pub fn on_success(mut self, method: Method, hook: ResponseHook) -> Self {
        self.hooks.push((method, hook));
        self
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn validator_for(&self, method: &Method) -> Option<Validator> {
        self.validators
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, validator)| *validator)
    }

    pub fn hook_for(&self, method: &Method) -> Option<ResponseHook> {
        self.hooks.iter().find(|(m, _)| m == method).map(|(_, hook)| *hook)
    }

    /// backend_target
    ///
    /// Substitutes path params into the backend template (URL-encoded) and
    /// appends the inbound query string verbatim.
    pub fn backend_target(&self, params: &HashMap<String, String>, query: Option<&str>) -> String {
        let mut path = self.backend_path.to_string();
        for (name, value) in params {
            path = path.replace(&format!("{{{name}}}"), &urlencoding::encode(value));
        }
        match query {
            Some(query) if !query.is_empty() => format!("{path}?{query}"),
            _ => path,
        }
    }

    fn allow_header(&self) -> String {
        self.methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// ProxyRequest
///
/// The parts of an inbound request the forwarding algorithm uses.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub params: HashMap<String, String>,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// RelayBody
///
/// A backend body after the JSON attempt. Error paths of the backend are not
/// guaranteed to be JSON, so text is a normal outcome, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayBody {
    Json(Value),
    Text(String),
}

impl RelayBody {
    pub fn parse(text: &str) -> RelayBody {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => RelayBody::Json(value),
            Err(_) => RelayBody::Text(text.to_string()),
        }
    }

    fn into_response_with(self, status: StatusCode) -> Response {
        match self {
            RelayBody::Json(value) => (status, Json(value)).into_response(),
            RelayBody::Text(text) => (status, text).into_response(),
        }
    }
}

/// forward
///
/// The proxy algorithm. Never fails: every error is converted into a response
/// at this boundary.
pub async fn forward(
    backend: &dyn Backend,
    config: &AppConfig,
    route: &ProxyRoute,
    request: ProxyRequest,
) -> Response {
    let method = request.method.clone();
    Span::current().record("proxy_route", route.path);
    match try_forward(backend, config, route, request).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                GatewayError::Backend(msg) => {
                    tracing::error!(route = route.path, %method, error = %msg, "backend call failed")
                }
                other => {
                    tracing::warn!(route = route.path, %method, error = %other, "request rejected")
                }
            }
            err.into_response()
        }
    }
}

async fn try_forward(
    backend: &dyn Backend,
    config: &AppConfig,
    route: &ProxyRoute,
    request: ProxyRequest,
) -> Result<Response, GatewayError> {
    let ProxyRequest {
        method,
        params,
        query,
        headers,
        body,
    } = request;

    // 1. Method check
    if !route.allows(&method) {
        return Err(GatewayError::MethodNotAllowed {
            method: method.to_string(),
            path: route.path.to_string(),
            allow: route.allow_header(),
        });
    }

    // 2. Shape validation, before any network traffic
    if let Some(validator) = route.validator_for(&method) {
        let parsed: Value =
            serde_json::from_slice(&body).map_err(|_| GatewayError::InvalidBody)?;
        validator(&parsed)?;
    }

    // 3. Resolve and send
    let has_body = !matches!(method, Method::GET | Method::HEAD);
    let backend_request = BackendRequest {
        method: method.clone(),
        path_and_query: route.backend_target(&params, query.as_deref()),
        bearer: cookies::extract_token(&headers),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: has_body.then_some(body),
    };

    let backend_response = backend.send(backend_request).await?;
    let status = backend_response.status;

    // 4. Translate, then run the success hook on the parsed body
    let mut relay = RelayBody::parse(&backend_response.body);
    let mut set_cookies = Vec::new();

    if status.is_success() {
        if let (Some(hook), RelayBody::Json(value)) = (route.hook_for(&method), &mut relay) {
            set_cookies = apply_hook(hook, value, &headers, config);
        }
    }

    let mut response = relay.into_response_with(status);
    for cookie in set_cookies {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

fn apply_hook(
    hook: ResponseHook,
    body: &mut Value,
    request_headers: &HeaderMap,
    config: &AppConfig,
) -> Vec<HeaderValue> {
    match hook {
        ResponseHook::StartSession => start_session(body, config),
        ResponseHook::RefreshIdentity => refresh_identity(body, request_headers, config)
            .into_iter()
            .collect(),
    }
}

/// start_session
///
/// Pulls the token and user out of a sign-in response, removes the token from
/// the body the browser sees, and returns the cookies to set.
fn start_session(body: &mut Value, config: &AppConfig) -> Vec<HeaderValue> {
    let Some(token) = take_token(body) else {
        tracing::warn!("sign-in succeeded without an access token in the response");
        return Vec::new();
    };

    let claim = login_user(body).and_then(|user| IdentityClaim::from_fields(user.clone()));
    if claim.is_none() {
        tracing::warn!("sign-in response carries no user with a known role; identity cookie not set");
    }

    let mut headers = HeaderMap::new();
    cookies::set_session_cookies(&mut headers, &token, claim.as_ref(), config);
    tracing::info!(role = ?claim.as_ref().map(IdentityClaim::role), "session started");
    headers.get_all(header::SET_COOKIE).iter().cloned().collect()
}

/// Removes every token key from the top level and from `data`, returning the first found.
fn take_token(body: &mut Value) -> Option<String> {
    let top = body.as_object_mut()?;
    let mut found = remove_token_keys(top);

    if let Some(Value::Object(data)) = top.get_mut("data") {
        let nested = remove_token_keys(data);
        found = found.or(nested);
    }

    found.filter(|token| !token.is_empty())
}

fn remove_token_keys(scope: &mut Map<String, Value>) -> Option<String> {
    let mut found = None;
    for key in TOKEN_KEYS {
        if let Some(Value::String(token)) = scope.remove(key) {
            found.get_or_insert(token);
        }
    }
    found
}

/// The user record of a sign-in response: `user`, `data.user`, or `data` itself.
fn login_user(body: &Value) -> Option<&Map<String, Value>> {
    body.get("user")
        .and_then(Value::as_object)
        .or_else(|| body.get("data").and_then(|data| data.get("user")).and_then(Value::as_object))
        .or_else(|| body.get("data").and_then(Value::as_object).filter(|data| data.contains_key("role")))
}

/// updated_user_fields
///
/// The user record of a profile-update response: `user`, else `data`, else the
/// top-level object when it looks like a user.
pub fn updated_user_fields(body: &Value) -> Option<&Map<String, Value>> {
    body.get("user")
        .and_then(Value::as_object)
        .or_else(|| body.get("data").and_then(Value::as_object))
        .or_else(|| {
            body.as_object()
                .filter(|top| USER_MARKERS.iter().any(|key| top.contains_key(*key)))
        })
}

/// refresh_identity
///
/// Decodes the current identity cookie, shallow-merges the updated fields over
/// it and re-issues the cookie. If the merge would leave no valid role, the
/// existing cookie is left alone.
fn refresh_identity(
    body: &Value,
    request_headers: &HeaderMap,
    config: &AppConfig,
) -> Option<HeaderValue> {
    let updates = updated_user_fields(body)?;
    let raw = cookies::extract_cookie(request_headers, cookies::IDENTITY_COOKIE);
    let current = auth::decode_fields(raw.as_deref()).unwrap_or_default();

    let Some(claim) = IdentityClaim::from_fields(auth::merge_fields(current, updates)) else {
        tracing::warn!("profile update would leave identity without a valid role; cookie kept");
        return None;
    };

    tracing::info!(role = ?claim.role(), "identity cookie refreshed");
    cookies::build_identity_cookie(&claim, config)
}
