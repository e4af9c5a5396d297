use zbus::{Result, proxy, zvariant::OwnedObjectPath};

/// Client for the legacy per-window menu registrar: windows that export an
/// app menu (rather than carrying one as a window property) register
/// themselves here, keyed by their window id.
#[proxy(
    interface = "com.canonical.AppMenu.Registrar",
    default_service = "com.canonical.AppMenu.Registrar",
    default_path = "/com/canonical/AppMenu/Registrar"
)]
pub(crate) trait AppMenuRegistrar {
    fn get_menu_for_window(&self, window_id: u32) -> Result<(String, OwnedObjectPath)>;

    #[zbus(signal)]
    fn window_registered(
        &self,
        window_id: u32,
        service: String,
        menu_object_path: OwnedObjectPath,
    ) -> Result<()>;

    #[zbus(signal)]
    fn window_unregistered(&self, window_id: u32) -> Result<()>;
}
