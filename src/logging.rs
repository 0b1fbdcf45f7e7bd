use tracing_subscriber::EnvFilter;

/// Install the global subscriber for a binary. `RUST_LOG` takes precedence
/// over `level`. Logs go to stderr; stdout belongs to the console.
pub fn init(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init()
}
