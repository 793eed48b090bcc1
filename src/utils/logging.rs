//! Tracing setup shared by the binary and the test suite.

use tracing::Level;

/// Initialize the global tracing subscriber at the given level.
///
/// Unknown level names fall back to `info`. Safe to call more than once;
/// later calls are no-ops so tests can initialize freely.
pub fn init(level: &str) {
    let max_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(false)
        .try_init();
}
