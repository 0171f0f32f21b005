//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable that switches log output to JSON.
pub const LOG_JSON_VAR: &str = "REVTEE_LOG_JSON";

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "revtee_dashboard=info,revtee_cli=info";

/// Install the global subscriber.
///
/// Logs go to stderr so stdout carries only command output. JSON is used
/// when `REVTEE_LOG_JSON` is set, text otherwise.
pub fn init() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let json = std::env::var_os(LOG_JSON_VAR).is_some();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
