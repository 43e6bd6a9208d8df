use std::env;

/// Environment variables consulted, in order, for the backend origin.
/// The first one that is set and non-empty wins.
pub const BACKEND_URL_VARS: [&str; 3] = ["BACKEND_URL", "API_BASE_URL", "NEXT_PUBLIC_API_URL"];

/// Production backend origin used when none of `BACKEND_URL_VARS` is set.
pub const DEFAULT_BACKEND_URL: &str = "https://api.courtbooking.app/api/v1";

/// AppConfig
///
/// Holds the gateway's entire configuration state. Immutable once loaded and
/// pulled into handlers via FromRef, in the same way as the rest of the
/// shared application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Drives log format and cookie defaults.
    pub env: Env,
    // Origin of the booking backend every proxy handler forwards to (no trailing slash).
    pub backend_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    // Optional `Domain` attribute for session cookies.
    pub cookie_domain: Option<String>,
    // Lifetime of both session cookies, in days.
    pub session_max_age_days: i64,
}

/// Env
///
/// Defines the runtime context, used to switch between developer-friendly
/// defaults (pretty logs, non-secure cookies over plain http) and production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            backend_url: "http://localhost:4000".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            cookie_secure: false,
            cookie_domain: None,
            session_max_age_days: 7,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the configuration at startup.
    /// Reads every parameter from environment variables and fails fast on values
    /// that would leave the gateway unable to reach its backend.
    ///
    /// # Panics
    /// Panics if the resolved backend URL is not an absolute http(s) URL, or if
    /// `SESSION_MAX_AGE_DAYS` is set but is not a positive integer.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let backend_url = resolve_backend_url(|name| env::var(name).ok());
        let parsed = reqwest::Url::parse(&backend_url)
            .expect("FATAL: backend URL must be an absolute URL.");
        if !matches!(parsed.scheme(), "http" | "https") {
            panic!("FATAL: backend URL must use http or https, got {}", parsed.scheme());
        }

        // Secure cookies are the production default; local http development needs them off.
        let cookie_secure = env::var("COOKIE_SECURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(env == Env::Production);

        let cookie_domain = env::var("COOKIE_DOMAIN").ok().filter(|d| !d.is_empty());

        let session_max_age_days = match env::var("SESSION_MAX_AGE_DAYS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .expect("FATAL: SESSION_MAX_AGE_DAYS must be a positive integer."),
            Err(_) => 7,
        };

        Self {
            env,
            backend_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            cookie_secure,
            cookie_domain,
            session_max_age_days,
        }
    }
}

/// resolve_backend_url
///
/// Walks `BACKEND_URL_VARS` in order through `lookup` and returns the first
/// non-empty value, falling back to `DEFAULT_BACKEND_URL`. Trailing slashes are
/// trimmed so that backend path templates can always start with `/`.
pub fn resolve_backend_url<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let raw = BACKEND_URL_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

    raw.trim_end_matches('/').to_string()
}
