//! Menu collectors: each mirrors one remote application menu into a flat,
//! matchable [`hud_source::Item`] list and exposes it as a
//! [`hud_source::Source`].
//!
//! Two wire protocols are supported, matching the two ways a Linux desktop
//! application exports its menu bar: the legacy `com.canonical.dbusmenu`
//! interface ([`DbusmenuCollector`]) and the GLib menu-model export
//! ([`MenuModelCollector`]).

mod collector;
mod dbusmenu_collector;
mod error;
mod menu_model_collector;
mod menu_model_mirror;
mod mirror;
mod proxy;
mod types;

pub use dbusmenu_collector::DbusmenuCollector;
pub use error::Error;
pub use menu_model_collector::MenuModelCollector;
