use tracing_subscriber::EnvFilter;

/// ONNX Runtime and hyper are chatty at `info`; keep them at `warn` unless
/// `RUST_LOG` says otherwise.
const DEFAULT_FILTER: &str = "info,ort=warn,hyper=warn,reqwest=warn";

/// Install the global fmt subscriber. A second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);
    if fmt.try_init().is_err() {
        tracing::debug!("Logging already initialised");
    }
}
