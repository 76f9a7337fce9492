//! Integration tests for runtime configuration and transport checks.

use cipherdesk_app::{AppConfig, AppError, DEFAULT_BASE_URL, is_https_endpoint};
use cipherdesk_probe::ProbeConfig;

#[test]
fn config_tests_defaults_match_service_contract() {
    let config = AppConfig::default();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.probe, ProbeConfig::default());
    assert_eq!(
        AppConfig::new(DEFAULT_BASE_URL, 15_000, 2_000).expect("config should build"),
        config
    );
}

#[test]
fn config_tests_rejects_empty_url_and_zero_delay() {
    assert!(matches!(
        AppConfig::new("  ", 15_000, 2_000),
        Err(AppError::Config(_))
    ));
    assert!(matches!(
        AppConfig::new(DEFAULT_BASE_URL, 15_000, 0),
        Err(AppError::Probe(_))
    ));
}

#[test]
fn config_tests_flags_non_https_endpoints() {
    assert!(is_https_endpoint(DEFAULT_BASE_URL));
    assert!(!is_https_endpoint("http://service.example.test"));
}
