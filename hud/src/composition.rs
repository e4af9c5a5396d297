//! Builds the root [`SourceList`] (§4.8): window menu, the two indicator
//! families, and — only under `HUD_DEBUG_SOURCE` — the synthetic clock
//! source used in development.

use std::env;
use std::sync::Arc;

use hud_source::{DebugSource, Source, SourceList};
use hud_sources::{AppIndicatorSource, HyprlandActiveWindowWatcher, IndicatorSource, WindowSource};
use zbus::Connection;

use crate::settings::Settings;

pub fn build_root_source(connection: &Connection, settings: &Settings) -> Arc<SourceList> {
    let list = Arc::new(SourceList::new());

    let watcher = Arc::new(HyprlandActiveWindowWatcher::connect());
    let window_source = WindowSource::new(connection.clone(), watcher) as Arc<dyn Source>;
    let indicator_source =
        IndicatorSource::new(connection.clone(), settings.indicator_penalty) as Arc<dyn Source>;
    let app_indicator_source =
        AppIndicatorSource::new(connection.clone(), settings.indicator_penalty) as Arc<dyn Source>;

    tokio::spawn({
        let list = list.clone();
        async move { list.add(window_source).await }
    });
    tokio::spawn({
        let list = list.clone();
        async move { list.add(indicator_source).await }
    });
    tokio::spawn({
        let list = list.clone();
        async move { list.add(app_indicator_source).await }
    });

    if env::var("HUD_DEBUG_SOURCE").is_ok() {
        let debug_source = DebugSource::new(settings.penalties) as Arc<dyn Source>;
        tokio::spawn({
            let list = list.clone();
            async move { list.add(debug_source).await }
        });
    }

    list
}
