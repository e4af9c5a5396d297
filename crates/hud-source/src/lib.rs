//! The `Source` capability, the `Item`/`MatchResult` data model, and
//! source composition (`SourceList`, the development-only `DebugSource`).

mod debug_source;
mod item;
mod result;
mod source;

pub use debug_source::DebugSource;
pub use item::{ActivationError, ActivationHandle, Item};
pub use result::MatchResult;
pub use source::{ChangedStream, Source, SourceList, relay_changed};
