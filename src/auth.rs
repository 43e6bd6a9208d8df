use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{cookies, models::SessionView};

/// Role
///
/// The closed set of account roles. There is no hierarchy between them: every
/// protected subtree lists the roles it admits explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Owner,
    Client,
}

impl Role {
    /// Strict parse of the wire value. Anything outside the closed set is `None`.
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "ADMIN" => Some(Role::Admin),
            "OWNER" => Some(Role::Owner),
            "CLIENT" => Some(Role::Client),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Owner => "OWNER",
            Role::Client => "CLIENT",
        }
    }
}

/// IdentityClaim
///
/// The validated content of the identity cookie: a known role plus the profile
/// fields the backend returned for the user. Every field of the original JSON
/// object (including `role`) is kept in `fields` so that encoding a decoded claim
/// reproduces it.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaim {
    role: Role,
    fields: Map<String, Value>,
}

impl IdentityClaim {
    /// from_fields
    ///
    /// Validates a raw JSON object. Returns `None` when `role` is missing, not a
    /// string, or not one of the three known roles.
    pub fn from_fields(fields: Map<String, Value>) -> Option<Self> {
        let role = fields.get("role").and_then(Value::as_str).and_then(Role::parse)?;
        Some(Self { role, fields })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn id(&self) -> Option<String> {
        match self.fields.get("id").or_else(|| self.fields.get("_id"))? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.non_empty_str("name")
    }

    pub fn email(&self) -> Option<&str> {
        self.non_empty_str("email")
    }

    /// Display name for headers and menus: name, then email, then a generic label.
    pub fn username(&self) -> String {
        self.name()
            .or_else(|| self.email())
            .unwrap_or("User")
            .to_string()
    }

    /// encode
    ///
    /// Serializes the claim to JSON and percent-encodes it into a cookie-safe value.
    pub fn encode(&self) -> String {
        let json = Value::Object(self.fields.clone()).to_string();
        urlencoding::encode(&json).into_owned()
    }

    /// merged
    ///
    /// Shallow-merges `updates` over the claim's fields (later keys win) and
    /// re-validates the result. `None` means the merge would produce a claim
    /// without a valid role.
    pub fn merged(&self, updates: &Map<String, Value>) -> Option<Self> {
        Self::from_fields(merge_fields(self.fields.clone(), updates))
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Identity
///
/// The typed outcome of reading the identity cookie. Every failure mode of the
/// decode collapses into `Anonymous`.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Authenticated(IdentityClaim),
    Anonymous,
}

impl Identity {
    /// decode
    ///
    /// URL-decodes then JSON-parses a raw cookie value. Missing value, bad
    /// percent-encoding, invalid JSON, non-object JSON, and missing or unknown
    /// role all yield `Anonymous`. Never fails.
    pub fn decode(raw: Option<&str>) -> Identity {
        match decode_fields(raw).and_then(IdentityClaim::from_fields) {
            Some(claim) => Identity::Authenticated(claim),
            None => Identity::Anonymous,
        }
    }

    /// Reads the identity cookie out of a request's `Cookie` headers.
    pub fn from_headers(headers: &HeaderMap) -> Identity {
        let raw = cookies::extract_cookie(headers, cookies::IDENTITY_COOKIE);
        let identity = Identity::decode(raw.as_deref());
        if raw.is_some() && identity == Identity::Anonymous {
            tracing::debug!("identity cookie present but unusable; treating request as anonymous");
        }
        identity
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Authenticated(claim) => Some(claim.role()),
            Identity::Anonymous => None,
        }
    }

    pub fn claim(&self) -> Option<&IdentityClaim> {
        match self {
            Identity::Authenticated(claim) => Some(claim),
            Identity::Anonymous => None,
        }
    }

    pub fn session_view(&self) -> SessionView {
        match self {
            Identity::Authenticated(claim) => SessionView {
                authenticated: true,
                role: Some(claim.role()),
                username: Some(claim.username()),
                profile: claim.fields().clone(),
            },
            Identity::Anonymous => SessionView {
                authenticated: false,
                role: None,
                username: None,
                profile: Map::new(),
            },
        }
    }
}

/// decode_fields
///
/// The structural half of `Identity::decode`: percent-decode and parse into a
/// JSON object without looking at the role. Used by the cookie refresh, which
/// merges into whatever object is present.
pub fn decode_fields(raw: Option<&str>) -> Option<Map<String, Value>> {
    let decoded = urlencoding::decode(raw?).ok()?;
    match serde_json::from_str::<Value>(&decoded).ok()? {
        Value::Object(fields) => Some(fields),
        _ => None,
    }
}

/// Shallow merge: top-level keys of `updates` replace those of `base`.
pub fn merge_fields(mut base: Map<String, Value>, updates: &Map<String, Value>) -> Map<String, Value> {
    for (key, value) in updates {
        base.insert(key.clone(), value.clone());
    }
    base
}

/// Identity Extractor Implementation
///
/// Makes `Identity` usable as a handler or middleware argument. Unlike an
/// authentication extractor it never rejects: anonymous requests are a normal
/// input to the guards, which decide what to do with them.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity::from_headers(&parts.headers))
    }
}
