//! [`Query`]: the per-search coordinator between a [`hud_source::Source`]
//! tree, the [`hud_usage::UsageTracker`] and an external caller.

mod error;
mod query;

pub use error::ExecuteError;
pub use query::Query;
