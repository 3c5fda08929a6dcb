//! Support code for the end-to-end tests in `tests/`.
//!
//! The solver framework that normally owns all models is not part of this
//! workspace. [`framework`] provides just enough of it to resolve input
//! references, wire value references and read values across models.

pub mod framework;

use tracing_subscriber::EnvFilter;

/// Routes `tracing` output of the code under test to the test harness.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
