//! Integration tests for settings loading
//!
//! Tests verify that batching configuration loads with sane values.

use stakenet_state_sdk::settings::Settings;

/// Test that state-fetch settings are correctly configured
#[test]
fn test_state_fetch_settings() {
    let settings = Settings::new().expect("Failed to load settings");

    assert!(
        settings.state_fetch.node_batch_size > 0,
        "Node batch size should be > 0"
    );
    assert!(
        settings.state_fetch.address_batch_size >= settings.state_fetch.node_batch_size,
        "Address chunks should be at least as large as detail chunks (one read per index)"
    );
    assert!(
        settings.state_fetch.multicall_batch_size > 0,
        "Multicall batch size should be > 0"
    );
}

/// Test that the checked-in Config.toml carries the documented defaults
#[test]
fn test_default_batch_configuration() {
    let settings = Settings::new().expect("Failed to load settings");

    assert_eq!(settings.state_fetch.node_batch_size, 200);
    assert_eq!(settings.state_fetch.address_batch_size, 2000);
    assert!(
        settings.state_fetch.concurrency >= 1 && settings.state_fetch.concurrency <= 64,
        "Concurrency cap should be a small constant tuned to the RPC endpoint"
    );
}
