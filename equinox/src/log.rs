use tracing_subscriber::EnvFilter;

/// Install the global subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init() {
    init_with(None);
}

/// Like [`init`], but an explicit filter takes precedence over `RUST_LOG`.
pub fn init_with(filter: Option<&str>) {
    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    // fails if a subscriber is already installed, eg. by a test harness
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
