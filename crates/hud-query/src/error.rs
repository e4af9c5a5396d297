use thiserror::Error;

/// Failure of [`crate::Query::execute`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecuteError {
    /// `key` didn't refer to a Result in the snapshot the query last handed
    /// out. Maps to `com.canonical.Hud.Error.UnknownKey` at the bus layer.
    #[error("unknown result key")]
    UnknownKey,

    /// The query was already closed by a previous `execute` call.
    #[error("query is closed")]
    Closed,
}
