use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the JSON subscriber CloudWatch ingests.
///
/// `RUST_LOG` takes precedence when set, otherwise the given level is used.
pub fn init(log_level: Option<&str>) {
    let level: String = log_level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_ascii_lowercase();

    let env_filter: EnvFilter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    // Lambda may reuse the process, in which case a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_current_span(true)
        .with_ansi(false)
        .without_time()
        .try_init();
}
