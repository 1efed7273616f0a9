use gd_telemetry::logging;

#[test]
fn init_logging_human_is_idempotent() {
    logging::init_logging("gd-test", "debug");
    logging::init_logging("gd-test", "info");

    tracing::info!(device_id = "x", "human-readable log line");
}

#[test]
fn init_logging_json_after_human_is_a_noop() {
    // Whichever test installs the global subscriber first wins; the rest
    // must not panic.
    logging::init_logging_json("gd-test-json", "info");
    tracing::warn!(address = "203.0.113.7", "json log line");
}

#[test]
fn init_by_flag() {
    logging::init("gd-flag", "warn", false);
    logging::init("gd-flag", "warn", true);
}
