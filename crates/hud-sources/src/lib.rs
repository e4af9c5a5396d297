//! Desktop-integration `Source`s: the focused window's menu
//! ([`WindowSource`]) and the system tray's two protocol families
//! ([`IndicatorSource`], [`AppIndicatorSource`]).

mod active_window;
mod app_indicator_source;
mod error;
mod hyprland;
mod indicator_source;
mod proxy;
mod window_source;

pub use active_window::{ActiveWindow, ActiveWindowWatcher};
pub use app_indicator_source::AppIndicatorSource;
pub use error::Error;
pub use hyprland::HyprlandActiveWindowWatcher;
pub use indicator_source::IndicatorSource;
pub use window_source::WindowSource;
