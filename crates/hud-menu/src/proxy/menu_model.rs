//! Wire proxies for the GLib menu-model export protocol: a menu model at
//! one object path (`org.gtk.Menus`) plus one or more action groups at
//! sibling paths (`org.gtk.Actions`), and the HUD's own awareness probe.

use std::collections::HashMap;

use zbus::{Result, proxy, zvariant::OwnedValue};

/// One row of a menu model section: `(group, id, position, properties)`.
/// `properties` carries `label`, `action`, `target` for leaf items and
/// `:section`/`:submenu` link targets (encoded as `(u32, u32)`) for
/// container rows.
pub(crate) type MenuModelRow = (u32, u32, u32, HashMap<String, OwnedValue>);

#[proxy(interface = "org.gtk.Menus")]
pub(crate) trait GtkMenus {
    /// Subscribes to and returns the content of the given menu groups.
    fn start(&self, groups: Vec<u32>) -> Result<Vec<MenuModelRow>>;

    /// Unsubscribes from the given menu groups.
    fn end(&self, groups: Vec<u32>) -> Result<()>;

    #[zbus(signal)]
    fn changed(&self, changes: Vec<(u32, u32, u32, u32)>) -> Result<()>;
}

#[proxy(interface = "org.gtk.Actions")]
pub(crate) trait GtkActions {
    /// Invokes `name` with an optional single-element parameter list and a
    /// platform-data dictionary (window hints, timestamp, ...).
    fn activate(
        &self,
        name: &str,
        parameter: Vec<OwnedValue>,
        platform_data: HashMap<String, OwnedValue>,
    ) -> Result<()>;

    #[zbus(signal)]
    fn changed(
        &self,
        removed: Vec<String>,
        enabled_changed: Vec<(String, bool)>,
        state_changed: Vec<(String, OwnedValue)>,
        added: Vec<(String, bool, Vec<OwnedValue>, OwnedValue)>,
    ) -> Result<()>;
}

#[proxy(interface = "com.canonical.hud.Awareness")]
pub(crate) trait HudAwareness {
    /// Probes the remote for HUD support. Succeeding means `use`/`unuse`
    /// transitions should emit `HudActiveChanged` (a bare signal emission
    /// addressed at the remote, not a method call — see
    /// [`crate::menu_model_collector`]).
    fn check_awareness(&self) -> Result<()>;
}
