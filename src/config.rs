use tracing_subscriber::EnvFilter;

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_BIN: &str = "ollama";

/// Used when `RUST_LOG` is unset. Anything below `error` stays out of the
/// terminal unless asked for.
pub const DEFAULT_LOG_FILTER: &str = "error";

pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(host: &str) -> Self {
        Self {
            base_url: normalize_base_url(host),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

/// Trims trailing slashes and fills in a missing scheme, so `localhost:11434`
/// (the form `OLLAMA_HOST` is often set to) works as a base URL.
fn normalize_base_url(value: &str) -> String {
    let value = value.trim().trim_end_matches('/');
    if value.contains("://") {
        value.to_string()
    } else {
        format!("http://{}", value)
    }
}
