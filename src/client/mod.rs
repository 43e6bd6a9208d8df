//! Client-side state for the back-office UI.
//!
//! Each slice mirrors one backend collection through the gateway's `/api`
//! proxy surface and keeps the last page, its metadata, and loading/error
//! flags. A `Store` composes them around a single transport.

use std::sync::Arc;

use axum::http::Method;
use serde_json::Value;
use tokio::sync::RwLock;

pub mod slice;
pub mod transport;

pub use slice::{ListQuery, ResourceSlice, SliceState};
pub use transport::{ApiFailure, ApiTransport, GatewayClient};

use crate::models::{Advertisement, Court, SportType, Subscription, User};

pub const USERS_ENDPOINT: &str = "/api/users";
pub const COURTS_ENDPOINT: &str = "/api/courts";
pub const ADVERTISEMENTS_ENDPOINT: &str = "/api/advertisements";
pub const SUBSCRIPTIONS_ENDPOINT: &str = "/api/subscriptions";
pub const SPORT_TYPES_ENDPOINT: &str = "/api/sport-types";
pub const REPORTS_ENDPOINT: &str = "/api/dashboard/reports";

/// ReportState
///
/// The latest dashboard report. Its shape belongs to the backend, so it is kept as JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportState {
    pub report: Option<Value>,
    pub loading: bool,
    pub error: Option<String>,
}

/// DashboardSlice
///
/// Holds the dashboard report. A fetch replaces the previous report.
#[derive(Clone)]
pub struct DashboardSlice {
    transport: Arc<dyn ApiTransport>,
    state: Arc<RwLock<ReportState>>,
}

impl DashboardSlice {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            state: Arc::new(RwLock::new(ReportState::default())),
        }
    }

    pub async fn snapshot(&self) -> ReportState {
        self.state.read().await.clone()
    }

    /// Fetches the report; `params` are forwarded as query parameters (e.g. a date range).
    pub async fn fetch(&self, params: &[(&str, &str)]) {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let path = if query.is_empty() {
            REPORTS_ENDPOINT.to_string()
        } else {
            format!("{REPORTS_ENDPOINT}?{query}")
        };

        let outcome = self.transport.request(Method::GET, &path, None).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match outcome {
            Ok(report) => state.report = Some(report),
            Err(failure) => state.error = Some(failure.message),
        }
    }
}

/// Store
///
/// Every slice of the back-office, sharing one transport. Built once at
/// composition time and passed by reference to whatever renders it.
#[derive(Clone)]
pub struct Store {
    pub users: ResourceSlice<User>,
    pub courts: ResourceSlice<Court>,
    pub advertisements: ResourceSlice<Advertisement>,
    pub subscriptions: ResourceSlice<Subscription>,
    pub sport_types: ResourceSlice<SportType>,
    pub dashboard: DashboardSlice,
}

impl Store {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            users: ResourceSlice::new(Arc::clone(&transport), USERS_ENDPOINT),
            courts: ResourceSlice::new(Arc::clone(&transport), COURTS_ENDPOINT),
            advertisements: ResourceSlice::new(Arc::clone(&transport), ADVERTISEMENTS_ENDPOINT),
            subscriptions: ResourceSlice::new(Arc::clone(&transport), SUBSCRIPTIONS_ENDPOINT),
            sport_types: ResourceSlice::new(Arc::clone(&transport), SPORT_TYPES_ENDPOINT),
            dashboard: DashboardSlice::new(transport),
        }
    }
}
