//! Structured logging setup, grounded on the console/file dual-layer used
//! elsewhere in this stack, simplified to the console-only half since the
//! HUD runs as a lifecycle-managed background service rather than a CLI.

use std::env;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = env::var("HUD_LOG_FORMAT").unwrap_or_else(|_| String::from("pretty"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format.as_str() {
        "json" => registry.with(fmt::layer().json().with_target(true)).try_init(),
        _ => registry
            .with(fmt::layer().pretty().with_target(true).with_level(true))
            .try_init(),
    }
}
