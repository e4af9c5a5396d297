//! Top-level error taxonomy (§7 of the design notes): only startup failures
//! propagate here. Once the service loop is running, every condition below
//! degrades some component in place rather than tearing down the process.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to the session bus: {0}")]
    Connection(#[from] zbus::Error),

    #[error("could not acquire bus name {0}: another HUD instance is likely running")]
    NameTaken(String),

    #[error("failed to initialise the usage tracker: {0}")]
    Usage(#[from] hud_usage::Error),

    #[error("failed to initialise logging: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
}
