//! Skip policy for suites that need the embedded PostgreSQL cluster.
//!
//! A cluster that fails to start is a test failure unless
//! `SKIP_TEST_CLUSTER` opts out, so broken CI environments are never masked
//! as green runs.

const SKIP_ENV: &str = "SKIP_TEST_CLUSTER";

/// True when `SKIP_TEST_CLUSTER` is "1", "true" or "yes" (any case).
pub fn should_skip_test_cluster() -> bool {
    std::env::var(SKIP_ENV)
        .map(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Print a skip marker and return `None` when skipping is allowed, otherwise
/// panic with the setup failure.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("test cluster setup failed: {reason}. Set {SKIP_ENV}=1 to skip.");
    }
}
