//! Durable activation-frequency store: [`UsageTracker`] answers "how often
//! has this item been picked", seeding freshly-discovered applications from
//! their `.hud-app-info` files on first reference.

mod app_info;
mod error;
mod tracker;

pub use error::{AppInfoError, Error};
pub use tracker::UsageTracker;
