pub fn init() {
    // Initialize tracing subscriber once, honoring RUST_LOG if set.
    // Default to info level; allow override via RUST_LOG (e.g., "debug").
    // Logs go to stderr so stdio MCP mode keeps stdout clean.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Record a per-tool measurement as a structured log line and a `metrics` histogram.
pub fn log_metric(tool: &str, metric: &str, value: f64) {
    tracing::info!(tool = tool, metric = metric, value = value, "metric");
    metrics::histogram!(metric.to_owned(), "tool" => tool.to_owned()).record(value);
}

/// Bump a per-tool counter.
pub fn count(tool: &str, metric: &str) {
    tracing::debug!(tool = tool, metric = metric, "counter");
    metrics::counter!(metric.to_owned(), "tool" => tool.to_owned()).increment(1);
}
