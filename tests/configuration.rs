use cloud_orders::config::ENV_PREFIX;
use cloud_orders::load_config;
use std::io::Write;

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(
        br#"
[logging]
level = "debug"

[ticketing]
resolved_state = "Resolved"
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(Some(file.path())).unwrap();

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.ticketing.resolved_state, "Resolved");
    assert_eq!(config.fulfillment.max_target_accounts, 20);
}

#[test]
fn test_invalid_file_rejected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"[fulfillment]\nmax_target_accounts = 0\n").unwrap();
    file.flush().unwrap();

    let error = load_config(Some(file.path())).unwrap_err();

    assert!(format!("{error:#}").contains("fulfillment.max_target_accounts"));
}

#[test]
fn test_missing_file_reports_path() {
    let error = load_config(Some(std::path::Path::new("/nonexistent/orders.toml"))).unwrap_err();

    assert!(error.to_string().contains("/nonexistent/orders.toml"));
    assert_eq!(ENV_PREFIX, "CLOUD_ORDERS");
}

#[test]
fn test_section_keys_read_from_environment() {
    std::env::set_var("CLOUD_ORDERS_FULFILLMENT__REDACTION_TOKEN", "[hidden]");

    let config = load_config(None);
    std::env::remove_var("CLOUD_ORDERS_FULFILLMENT__REDACTION_TOKEN");

    assert_eq!(config.unwrap().fulfillment.redaction_token, "[hidden]");
}
