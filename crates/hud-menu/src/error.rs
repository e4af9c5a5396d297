//! Error taxonomy for menu collectors.

/// Errors a collector can report. None of these are fatal: transport
/// failures degrade the collector into an observable "error" state rather
/// than propagating to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A bus call to the remote menu failed.
    #[error("dbus call to {service} failed: {reason}")]
    Transport {
        /// The remote bus name being talked to.
        service: String,
        /// The underlying failure.
        reason: String,
    },

    /// The remote returned data this collector could not interpret.
    #[error("protocol error from {service}: {reason}")]
    Protocol {
        /// The remote bus name being talked to.
        service: String,
        /// What was unexpected about the response.
        reason: String,
    },

    #[error(transparent)]
    Dbus(#[from] zbus::Error),
}
