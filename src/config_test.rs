use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_client_env() {
    unsafe {
        std::env::remove_var("LEDGERGATE_API_BASE_URL");
        std::env::remove_var("LEDGERGATE_STORE_PATH");
        std::env::remove_var("LEDGERGATE_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("LEDGERGATE_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("LEDGERGATE_TOAST_DURATION_MS");
        std::env::remove_var("LEDGERGATE_PREFERS_DARK");
    }
}

#[test]
fn from_env_defaults_and_overrides() {
    unsafe { clear_client_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg, ClientConfig::default());

    unsafe {
        std::env::set_var("LEDGERGATE_API_BASE_URL", "https://books.example.test/");
        std::env::set_var("LEDGERGATE_STORE_PATH", "/tmp/session.json");
        std::env::set_var("LEDGERGATE_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("LEDGERGATE_CONNECT_TIMEOUT_SECS", "nope");
        std::env::set_var("LEDGERGATE_TOAST_DURATION_MS", "1500");
        std::env::set_var("LEDGERGATE_PREFERS_DARK", "true");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, "https://books.example.test");
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/session.json"));
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 42, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS });
    assert_eq!(cfg.toast_duration, Duration::from_millis(1500));
    assert!(cfg.prefers_dark);

    unsafe {
        std::env::set_var("LEDGERGATE_API_BASE_URL", "ftp://books.example.test");
    }
    assert!(matches!(ClientConfig::from_env(), Err(ConfigError::UnsupportedScheme(_))));

    unsafe { clear_client_env() };
}

#[test]
fn parse_base_url_rejects_empty() {
    assert_eq!(parse_base_url("   "), Err(ConfigError::EmptyBaseUrl));
    assert_eq!(parse_base_url("/"), Err(ConfigError::EmptyBaseUrl));
}

#[test]
fn parse_base_url_strips_trailing_slashes() {
    assert_eq!(parse_base_url("http://localhost:8080//").unwrap(), "http://localhost:8080");
}

#[test]
fn env_parse_falls_back_on_garbage() {
    let key = "__TEST_LG_ENV_PARSE_7731__";
    unsafe { std::env::set_var(key, " 12 ") };
    assert_eq!(env_parse(key, 5_u64), 12);
    unsafe { std::env::set_var(key, "twelve") };
    assert_eq!(env_parse(key, 5_u64), 5);
    unsafe { std::env::remove_var(key) };
    assert_eq!(env_parse(key, 5_u64), 5);
}

#[test]
fn timeouts_convert_to_durations() {
    let t = HttpTimeouts { request_secs: 3, connect_secs: 1 };
    assert_eq!(t.request(), Duration::from_secs(3));
    assert_eq!(t.connect(), Duration::from_secs(1));
}
