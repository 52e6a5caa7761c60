use tracing_subscriber::EnvFilter;

/// Installs the process-wide fmt subscriber. The level comes from `RUST_LOG`
/// and falls back to `info`. Calling it twice is harmless.
pub fn init_log() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_line_number(true)
        .with_thread_ids(true)
        .try_init();
}
