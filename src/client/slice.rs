use std::sync::Arc;

use axum::http::Method;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;

use super::transport::ApiTransport;
use crate::models::{Advertisement, PageMeta, Resource, User};

/// SliceState
///
/// What a resource slice caches for the UI: the current page of items, its
/// pagination metadata, and request status.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceState<T> {
    pub items: Vec<T>,
    pub meta: Option<PageMeta>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for SliceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            meta: None,
            loading: false,
            error: None,
        }
    }
}

// Reducers. Each one settles the request (`loading = false`).
impl<T: Resource> SliceState<T> {
    /// An action was dispatched: mark loading and drop the previous error.
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// fetch-list: the server's page replaces the list and metadata wholesale.
    pub fn replace_page(&mut self, items: Vec<T>, meta: Option<PageMeta>) {
        self.loading = false;
        self.items = items;
        self.meta = meta;
    }

    /// create: newest first.
    pub fn prepend(&mut self, item: T) {
        self.loading = false;
        self.items.insert(0, item);
    }

    /// update and item actions: replace in place, no-op when the id is not held locally.
    pub fn replace(&mut self, item: T) {
        self.loading = false;
        if let Some(slot) = self.items.iter_mut().find(|held| held.id() == item.id()) {
            *slot = item;
        }
    }

    /// delete
    pub fn remove(&mut self, id: &str) {
        self.loading = false;
        self.items.retain(|held| held.id() != id);
    }

    /// Any rejected action.
    pub fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}

/// ListQuery
///
/// Pagination and search parameters for fetch-list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListQuery {
    /// `?page=..&limit=..&search=..` with only the set parameters, or empty.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(format!("page={page}"));
        }
        if let Some(limit) = self.limit {
            pairs.push(format!("limit={limit}"));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(format!("search={}", urlencoding::encode(search)));
        }

        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        }
    }
}

/// parse_page
///
/// Accepts either a bare array or `{data: [...], meta: {...}}`.
pub fn parse_page<T: Resource>(body: Value) -> Result<(Vec<T>, Option<PageMeta>), String> {
    let (data, meta) = match body {
        Value::Array(_) => (body, None),
        Value::Object(mut envelope) => {
            let data = envelope.remove("data").unwrap_or(Value::Null);
            let meta = envelope
                .remove("meta")
                .and_then(|meta| serde_json::from_value::<PageMeta>(meta).ok());
            (data, meta)
        }
        other => return Err(format!("Unexpected list response: {other}")),
    };

    let items = serde_json::from_value::<Vec<T>>(data)
        .map_err(|err| format!("Unexpected list response: {err}"))?;
    Ok((items, meta))
}

/// parse_item
///
/// Accepts either the item itself or `{data: item}`.
pub fn parse_item<T: Resource>(body: Value) -> Result<T, String> {
    let item = match body {
        Value::Object(mut envelope) if envelope.get("data").is_some_and(Value::is_object) => {
            envelope.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value::<T>(item).map_err(|err| format!("Unexpected item response: {err}"))
}

/// ResourceSlice
///
/// State container for one backend collection, driven through the proxy
/// surface. Actions never return errors: a rejection lands in `error`.
///
/// Several actions may be in flight at once. The lock is only taken to reduce a
/// result, so whichever request resolves last determines the final state.
pub struct ResourceSlice<T> {
    transport: Arc<dyn ApiTransport>,
    endpoint: String,
    state: Arc<RwLock<SliceState<T>>>,
}

impl<T> Clone for ResourceSlice<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            endpoint: self.endpoint.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Resource> ResourceSlice<T> {
    pub fn new(transport: Arc<dyn ApiTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            state: Arc::new(RwLock::new(SliceState::default())),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// A copy of the current state for rendering.
    pub async fn snapshot(&self) -> SliceState<T> {
        self.state.read().await.clone()
    }

    pub async fn fetch_list(&self, query: &ListQuery) {
        let path = format!("{}{}", self.endpoint, query.to_query_string());
        let outcome = self.call(Method::GET, &path, None).await.and_then(parse_page::<T>);
        self.settle(outcome, |state, (items, meta)| state.replace_page(items, meta))
            .await;
    }

    pub async fn create(&self, body: Value) {
        let outcome = self
            .call(Method::POST, &self.endpoint, Some(body))
            .await
            .and_then(parse_item::<T>);
        self.settle(outcome, SliceState::prepend).await;
    }

    pub async fn update(&self, id: &str, body: Value) {
        let outcome = self
            .call(Method::PATCH, &self.item_path(id), Some(body))
            .await
            .and_then(parse_item::<T>);
        self.settle(outcome, SliceState::replace).await;
    }

    pub async fn delete(&self, id: &str) {
        let outcome = self.call(Method::DELETE, &self.item_path(id), None).await;
        self.settle(outcome, |state, _| state.remove(id)).await;
    }

    /// PATCH `{endpoint}/{id}/{action}` and replace the returned item in place.
    pub(crate) async fn item_action(&self, id: &str, action: &str, body: Value) {
        let path = format!("{}/{}", self.item_path(id), action);
        let outcome = self
            .call(Method::PATCH, &path, Some(body))
            .await
            .and_then(parse_item::<T>);
        self.settle(outcome, SliceState::replace).await;
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint, urlencoding::encode(id))
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, String> {
        self.state.write().await.begin();
        self.transport
            .request(method, path, body)
            .await
            .map_err(|failure| failure.message)
    }

    async fn settle<R, F>(&self, outcome: Result<R, String>, reduce: F)
    where
        F: FnOnce(&mut SliceState<T>, R),
    {
        let mut state = self.state.write().await;
        match outcome {
            Ok(result) => reduce(&mut *state, result),
            Err(message) => {
                tracing::debug!(endpoint = %self.endpoint, error = %message, "slice action rejected");
                state.fail(message);
            }
        }
    }
}

// --- Resource-specific actions ---

impl ResourceSlice<Advertisement> {
    /// Moves a banner in the display order.
    pub async fn set_priority(&self, id: &str, priority: i64) {
        self.item_action(id, "priority", json!({ "priority": priority }))
            .await;
    }

    /// Flips the home-page flag relative to the locally held item.
    pub async fn toggle_home(&self, id: &str) {
        let current = self
            .state
            .read()
            .await
            .items
            .iter()
            .find(|ad| ad.id == id)
            .map(|ad| ad.is_home);

        let body = match current {
            Some(is_home) => json!({ "isHome": !is_home }),
            // Not held locally: let the backend flip its own value.
            None => Value::Object(Map::new()),
        };
        self.item_action(id, "home", body).await;
    }
}

impl ResourceSlice<User> {
    /// Restores a deleted account.
    pub async fn recover(&self, id: &str) {
        self.item_action(id, "recover", Value::Object(Map::new()))
            .await;
    }
}
