use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::auth::Role;

// --- Gateway Response Schemas ---

/// MessageBody
///
/// The `{"message": ...}` envelope used by every response the gateway authors
/// itself (validation failures, backend failures, sign-out).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// NavItem
///
/// One entry of the back-office navigation menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavItem {
    pub label: String,
    pub href: String,
}

/// LayoutShell
///
/// What the protected section's shell needs to render: who is signed in, which
/// page was requested and the role-specific menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LayoutShell {
    pub username: String,
    pub role: Role,
    pub path: String,
    pub nav: Vec<NavItem>,
}

/// SessionView
///
/// Client-facing view of the decoded identity cookie (GET /api/session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub username: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    #[schema(value_type = Object)]
    pub profile: Map<String, Value>,
}

/// PublicPage
///
/// Data behind the public pages (home, sign-in): the page key and, when signed
/// in, the session so the header can greet the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PublicPage {
    pub page: String,
    pub user: Option<SessionView>,
}

/// PageMeta
///
/// Pagination metadata returned by the backend next to a page of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

// --- Resource Models (mirrors of backend collections) ---

/// Resource
///
/// Anything a client slice can hold in its list: it must be identifiable so
/// update/delete reducers can find it.
pub trait Resource: serde::de::DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// Backends disagree on `id` vs `_id` and on string vs numeric keys; both end up as a string here.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!("invalid id: {other}"))),
    }
}

/// User
///
/// An account as listed in the admin users table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    // Kept as the raw string: an unknown role must not hide the row from the admin.
    #[serde(default)]
    pub role: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Court
///
/// A bookable court ("field") owned by an OWNER account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Court {
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub sport_type: Value,
    #[serde(default)]
    pub img_urls: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Advertisement
///
/// A promotional banner. `priority` orders banners; `is_home` pins one to the home page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub is_home: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Subscription
///
/// A subscription package offered to court owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// SportType
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportType {
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for User {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Resource for Court {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Resource for Advertisement {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Resource for Subscription {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Resource for SportType {
    fn id(&self) -> &str {
        &self.id
    }
}
