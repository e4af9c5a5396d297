use zbus::{Result, proxy, zvariant::OwnedObjectPath};

/// One row of `GetApplications`'s reply: `(icon_name, position, dbus_name,
/// dbus_menu_path, icon_accessible_desc, label, label_guide, label_guide2,
/// id, title)`. Only the fields this source acts on are named; the rest
/// mirror the legacy service's wire shape unused.
pub(crate) type ApplicationDescription = (
    String,
    i32,
    String,
    OwnedObjectPath,
    String,
    String,
    String,
    String,
    String,
    String,
);

/// Client for the legacy "application indicator" service: third-party tray
/// icons (not full desktop indicators) register their menu here in lieu of
/// the freedesktop StatusNotifierItem protocol.
#[proxy(
    interface = "com.canonical.indicator.application.service",
    default_service = "com.canonical.indicator.application",
    default_path = "/com/canonical/indicator/application/service"
)]
pub(crate) trait AppIndicatorService {
    fn get_applications(&self) -> Result<Vec<ApplicationDescription>>;

    #[zbus(signal)]
    fn application_added(&self, description: ApplicationDescription) -> Result<()>;

    #[zbus(signal)]
    fn application_removed(&self, position: i32) -> Result<()>;

    #[zbus(signal)]
    fn application_icon_changed(
        &self,
        position: i32,
        icon_name: String,
        icon_accessible_description: String,
    ) -> Result<()>;

    #[zbus(signal)]
    fn application_title_changed(&self, position: i32, title: String) -> Result<()>;

    #[zbus(signal)]
    fn application_label_changed(
        &self,
        position: i32,
        label: String,
        guide: String,
    ) -> Result<()>;

    #[zbus(signal)]
    fn application_icon_theme_path_changed(&self, icon_theme_path: String) -> Result<()>;
}
