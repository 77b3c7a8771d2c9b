use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,winit=warn,puffin_http=warn";

/// Installs the fmt subscriber, honouring `RUST_LOG` when set.
///
/// Plugins may be instantiated several times per process, so a second call is silently ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
