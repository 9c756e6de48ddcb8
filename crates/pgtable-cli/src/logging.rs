use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber. Logs go to stderr so prompts and tables on
/// stdout stay readable; `RUST_LOG` overrides the default `info` level.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
