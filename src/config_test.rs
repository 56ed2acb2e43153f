use super::*;

#[test]
fn default_points_at_local_api() {
    let config = ClientConfig::default();
    assert_eq!(config.base_url, "http://localhost:5000/api");
    assert_eq!(config.connect_timeout_secs, 10);
    assert_eq!(config.request_timeout_secs, None);
}

#[test]
fn normalize_trims_trailing_slashes() {
    assert_eq!(normalize_base_url("https://example.com/api//").unwrap(), "https://example.com/api");
}

#[test]
fn normalize_trims_whitespace() {
    assert_eq!(normalize_base_url("  http://127.0.0.1:5000/api \n").unwrap(), "http://127.0.0.1:5000/api");
}

#[test]
fn normalize_rejects_missing_scheme() {
    assert!(matches!(normalize_base_url("localhost:5000/api"), Err(ApiError::InvalidConfig(_))));
}

#[test]
fn normalize_rejects_bare_scheme() {
    assert!(normalize_base_url("http://").is_err());
}

#[test]
fn new_keeps_default_timeouts() {
    let config = ClientConfig::new("http://api.test/").unwrap();
    assert_eq!(config.base_url, "http://api.test");
    assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
}
