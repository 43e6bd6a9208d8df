use court_gateway::{
    AppConfig,
    config::{DEFAULT_BACKEND_URL, Env, resolve_backend_url},
};
use serial_test::serial;
use std::{collections::HashMap, env, panic};

// --- Setup/Teardown Utilities ---

const CONFIG_VARS: [&str; 9] = [
    "APP_ENV",
    "BACKEND_URL",
    "API_BASE_URL",
    "NEXT_PUBLIC_API_URL",
    "BIND_ADDR",
    "COOKIE_SECURE",
    "COOKIE_DOMAIN",
    "SESSION_MAX_AGE_DAYS",
    "RUST_LOG",
];

/// Runs `test` with every config variable cleared, then restores the originals.
fn run_with_clean_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    unsafe {
        for (key, original_value) in originals {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

// --- Backend URL resolution (pure) ---

#[test]
fn test_backend_url_defaults_to_production_origin() {
    assert_eq!(resolve_backend_url(lookup_from(&[])), DEFAULT_BACKEND_URL);
}

#[test]
fn test_backend_url_fallback_order() {
    let all = lookup_from(&[
        ("BACKEND_URL", "http://first"),
        ("API_BASE_URL", "http://second"),
        ("NEXT_PUBLIC_API_URL", "http://third"),
    ]);
    assert_eq!(resolve_backend_url(all), "http://first");

    let last_two = lookup_from(&[
        ("API_BASE_URL", "http://second"),
        ("NEXT_PUBLIC_API_URL", "http://third"),
    ]);
    assert_eq!(resolve_backend_url(last_two), "http://second");

    let only_public = lookup_from(&[("NEXT_PUBLIC_API_URL", "http://third")]);
    assert_eq!(resolve_backend_url(only_public), "http://third");
}

#[test]
fn test_backend_url_skips_empty_values_and_trims_slash() {
    let lookup = lookup_from(&[("BACKEND_URL", "  "), ("API_BASE_URL", "http://api.local/v1/")]);
    assert_eq!(resolve_backend_url(lookup), "http://api.local/v1");
}

// --- AppConfig::load (environment) ---

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_clean_env(|| {
        unsafe {
            env::set_var("APP_ENV", "local");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert!(!config.cookie_secure, "local cookies must work over plain http");
    assert_eq!(config.cookie_domain, None);
    assert_eq!(config.session_max_age_days, 7);
}

#[test]
#[serial]
fn test_app_config_production_secures_cookies() {
    let config = run_with_clean_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("BACKEND_URL", "https://backend.internal/api/");
            env::set_var("COOKIE_DOMAIN", "courtbooking.app");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.backend_url, "https://backend.internal/api");
    assert!(config.cookie_secure);
    assert_eq!(config.cookie_domain.as_deref(), Some("courtbooking.app"));
}

#[test]
#[serial]
fn test_app_config_cookie_secure_override() {
    let config = run_with_clean_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("COOKIE_SECURE", "false");
        }
        AppConfig::load()
    });

    assert!(!config.cookie_secure);
}

#[test]
#[serial]
fn test_app_config_invalid_backend_url_fails_fast() {
    let result = run_with_clean_env(|| {
        unsafe {
            env::set_var("BACKEND_URL", "not a url");
        }
        panic::catch_unwind(AppConfig::load)
    });

    assert!(result.is_err(), "an unparseable backend URL must abort startup");
}

#[test]
#[serial]
fn test_app_config_rejects_non_positive_session_age() {
    let result = run_with_clean_env(|| {
        unsafe {
            env::set_var("SESSION_MAX_AGE_DAYS", "0");
        }
        panic::catch_unwind(AppConfig::load)
    });

    assert!(result.is_err());
}
