//! Skip policy for suites that need the embedded PostgreSQL cluster.
//!
//! Developers without the PostgreSQL binaries can export
//! `SKIP_TEST_CLUSTER=1`; everywhere else a cluster failure fails the test so
//! CI never silently loses the Diesel adapter coverage.

const SKIP_VAR: &str = "SKIP_TEST_CLUSTER";

/// Whether `SKIP_TEST_CLUSTER` holds `1`, `true` or `yes` in any case.
pub fn should_skip_test_cluster() -> bool {
    std::env::var(SKIP_VAR).is_ok_and(|value| {
        let value = value.trim().to_ascii_lowercase();
        matches!(value.as_str(), "1" | "true" | "yes")
    })
}

/// Turn a cluster setup failure into a skip (`None`) or a panic.
///
/// # Panics
///
/// Panics with `reason` unless skipping is enabled.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    assert!(
        should_skip_test_cluster(),
        "embedded PostgreSQL unavailable: {reason}; export {SKIP_VAR}=1 to skip"
    );
    eprintln!("SKIP-TEST-CLUSTER: {reason}");
    None
}
