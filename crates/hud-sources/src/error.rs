//! Error taxonomy for desktop-integration sources.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("dbus call to {service} failed: {reason}")]
    Transport { service: String, reason: String },

    #[error(transparent)]
    Dbus(#[from] zbus::Error),
}
