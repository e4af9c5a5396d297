mod composition;
mod error;
mod service;
mod settings;
mod tracing_init;

use std::sync::Arc;

use error::Error;
use hud_usage::UsageTracker;
use service::HudService;
use settings::{EnvSettingsSource, SettingsStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_init::init()?;

    let settings = SettingsStore::new(Box::new(EnvSettingsSource));
    let usage = Arc::new(UsageTracker::new(settings.get().store_usage_data)?);
    usage.drop_stale().await;

    let connection = zbus::Connection::session().await?;
    let source = composition::build_root_source(&connection, &settings.get());
    let hud_service = HudService::new(source, usage.clone());

    connection
        .object_server()
        .at(service::OBJECT_PATH, hud_service)
        .await?;

    connection
        .request_name(service::BUS_NAME)
        .await
        .map_err(|_| Error::NameTaken(service::BUS_NAME.to_string()))?;

    info!(bus_name = service::BUS_NAME, "hud service ready");

    let daily_usage = usage.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
        loop {
            ticker.tick().await;
            daily_usage.drop_stale().await;
        }
    });

    std::future::pending::<()>().await;
    warn!("hud service exiting");
    Ok(())
}
