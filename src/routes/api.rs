use std::{collections::HashMap, sync::Arc};

use crate::{
    AppState,
    proxy::{self, ProxyRequest, ProxyRoute, ResponseHook},
    validation,
};
use axum::{
    Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    routing::any,
};

/// proxy_table
///
/// The whole proxy surface: one entry per backend resource and sub-action.
/// Gateway paths live under `/api`; backend paths are relative to the
/// configured backend origin.
pub fn proxy_table() -> Vec<ProxyRoute> {
    use Method as M;

    vec![
        // --- Authentication & account recovery ---
        ProxyRoute::new("/api/auth/login", "/auth/login", &[M::POST])
            .on_success(M::POST, ResponseHook::StartSession),
        ProxyRoute::new("/api/auth/register", "/auth/register", &[M::POST]),
        ProxyRoute::new("/api/auth/forgot-password", "/auth/forgot-password", &[M::POST]),
        ProxyRoute::new("/api/auth/reset-password", "/auth/reset-password", &[M::POST]),
        // --- Own profile ---
        ProxyRoute::new("/api/profile", "/users/me", &[M::GET, M::PATCH])
            .on_success(M::PATCH, ResponseHook::RefreshIdentity),
        ProxyRoute::new("/api/profile/password", "/users/me/password", &[M::PATCH]),
        // --- Users (admin) ---
        ProxyRoute::new("/api/users", "/users", &[M::GET, M::POST]),
        ProxyRoute::new("/api/users/{id}", "/users/{id}", &[M::GET, M::PATCH, M::DELETE]),
        ProxyRoute::new("/api/users/{id}/recover", "/users/{id}/recover", &[M::PATCH]),
        // --- Courts (owner) ---
        ProxyRoute::new("/api/courts", "/courts", &[M::GET, M::POST])
            .validate(M::POST, validation::court),
        ProxyRoute::new("/api/courts/{id}", "/courts/{id}", &[M::GET, M::PATCH, M::DELETE])
            .validate(M::PATCH, validation::court),
        // --- Advertisements ---
        ProxyRoute::new("/api/advertisements", "/advertisements", &[M::GET, M::POST])
            .validate(M::POST, validation::advertisement),
        ProxyRoute::new("/api/advertisements/{id}", "/advertisements/{id}", &[M::PATCH, M::DELETE]),
        ProxyRoute::new(
            "/api/advertisements/{id}/priority",
            "/advertisements/{id}/priority",
            &[M::PATCH],
        )
        .validate(M::PATCH, validation::advertisement_priority),
        ProxyRoute::new("/api/advertisements/{id}/home", "/advertisements/{id}/home", &[M::PATCH]),
        // --- Subscription packages ---
        ProxyRoute::new("/api/subscriptions", "/subscriptions", &[M::GET, M::POST])
            .validate(M::POST, validation::subscription),
        ProxyRoute::new("/api/subscriptions/{id}", "/subscriptions/{id}", &[M::PATCH, M::DELETE]),
        // --- Sport types ---
        ProxyRoute::new("/api/sport-types", "/sport-types", &[M::GET, M::POST])
            .validate(M::POST, validation::sport_type),
        ProxyRoute::new("/api/sport-types/{id}", "/sport-types/{id}", &[M::PATCH, M::DELETE]),
        // --- Dashboard reports ---
        ProxyRoute::new("/api/dashboard/reports", "/dashboard/reports", &[M::GET]),
    ]
}

/// API Router Module
///
/// Mounts every `ProxyRoute` on its gateway path. Each route accepts any method
/// at the routing level and lets the proxy reject the ones it does not list, so
/// that the 405 carries the same `{message}` body as every other proxy error.
pub fn api_routes(table: Vec<ProxyRoute>) -> Router<AppState> {
    table.into_iter().fold(Router::new(), |router, route| {
        let path = route.path;
        let route = Arc::new(route);

        router.route(
            path,
            any(
                move |State(state): State<AppState>,
                      method: Method,
                      params: Option<Path<HashMap<String, String>>>,
                      RawQuery(query): RawQuery,
                      headers: HeaderMap,
                      body: Bytes| {
                    let route = Arc::clone(&route);
                    async move {
                        let request = ProxyRequest {
                            method,
                            params: params.map(|Path(params)| params).unwrap_or_default(),
                            query,
                            headers,
                            body,
                        };
                        proxy::forward(state.backend.as_ref(), &state.config, &route, request).await
                    }
                },
            ),
        )
    })
}
