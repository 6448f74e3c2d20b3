use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber used by every maintenance binary.
///
/// `RUST_LOG` wins when set; otherwise our logs are shown at info and the
/// driver's connection chatter is limited to warnings.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn default_filter() -> EnvFilter {
    EnvFilter::new("info,mongodb=warn")
}
