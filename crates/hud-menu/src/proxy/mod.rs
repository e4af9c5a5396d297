mod dbusmenu;
mod menu_model;

pub(crate) use dbusmenu::DBusMenuProxy;
pub(crate) use menu_model::{GtkActionsProxy, GtkMenusProxy, HudAwarenessProxy, MenuModelRow};
