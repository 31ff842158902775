// Installing the global subscriber is process-wide, so this lives in its
// own test binary and stays away from the test-log harness.

use std::fs;
use tempfile::tempdir;

use troupe::logging::setup_global_logging;

#[test]
fn global_logging_writes_events_to_the_log_file() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("logs").join("troupe.log");

    setup_global_logging(&log_path, &tracing::Level::DEBUG, false).unwrap();
    tracing::info!("container pool came up");

    let contents = fs::read_to_string(&log_path).unwrap();
    assert!(
        contents.contains("container pool came up"),
        "log file should carry the emitted event, got: {contents}"
    );

    // A second install must fail cleanly rather than panic.
    assert!(setup_global_logging(&log_path, &tracing::Level::DEBUG, false).is_err());
}
