//! `AppIndicatorSource`: dynamic, driven by the single legacy "application
//! indicator" service. Each indicator entry is backed by a
//! [`DbusmenuCollector`], addressed via the `(bus_name, object_path)` pair
//! the service's `GetApplications` reply carries for that entry — this is
//! a distinct legacy protocol from the freedesktop StatusNotifierItem
//! standard, and shares no wire shape with it.

use std::sync::Arc;

use async_trait::async_trait;
use hud_distance::TokenList;
use hud_menu::DbusmenuCollector;
use hud_source::{ChangedStream, MatchResult, Source, relay_changed};
use tokio::sync::{Mutex, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use zbus::Connection;
use zbus::fdo::DBusProxy;

use crate::proxy::{ApplicationDescription, AppIndicatorServiceProxy};

const SERVICE_BUS_NAME: &str = "com.canonical.indicator.application";

struct Entry {
    collector: Arc<dyn Source>,
    /// Cancels the task relaying this collector's own `changed()` into
    /// `changed_tx` for as long as the entry stays registered.
    relay_cancel: CancellationToken,
}

pub struct AppIndicatorSource {
    connection: Connection,
    indicator_penalty: u32,
    entries: Mutex<Vec<Entry>>,
    ready: Mutex<bool>,
    use_count: Mutex<u32>,
    changed_tx: broadcast::Sender<()>,
    cancellation_token: CancellationToken,
}

impl AppIndicatorSource {
    pub fn new(connection: Connection, indicator_penalty: u32) -> Arc<Self> {
        let (changed_tx, _) = broadcast::channel(16);
        let source = Arc::new(Self {
            connection: connection.clone(),
            indicator_penalty,
            entries: Mutex::new(Vec::new()),
            ready: Mutex::new(false),
            use_count: Mutex::new(0),
            changed_tx,
            cancellation_token: CancellationToken::new(),
        });

        let weak = Arc::downgrade(&source);
        let token = source.cancellation_token.clone();
        tokio::spawn(async move {
            let Ok(dbus_proxy) = DBusProxy::new(&connection).await else {
                return;
            };
            let Ok(mut name_owner_changed) = dbus_proxy.receive_name_owner_changed().await else {
                return;
            };

            if let Ok(name) = zbus::names::BusName::try_from(SERVICE_BUS_NAME) {
                if let Ok(true) = dbus_proxy.name_has_owner(name).await {
                    if let Some(source) = weak.upgrade() {
                        source.go_ready().await;
                    }
                }
            }

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    signal = futures::StreamExt::next(&mut name_owner_changed) => {
                        let Some(signal) = signal else { break };
                        let Some(source) = weak.upgrade() else { break };
                        let Ok(args) = signal.args() else { continue };
                        if args.name.as_str() != SERVICE_BUS_NAME {
                            continue;
                        }
                        if args.new_owner.is_some() {
                            // A reappearance with a different owner is a full
                            // resynchronise, same as first appearance.
                            source.go_ready().await;
                        } else {
                            source.go_unready().await;
                        }
                    }
                }
            }
        });

        source
    }

    async fn service_proxy(&self) -> Option<AppIndicatorServiceProxy<'static>> {
        AppIndicatorServiceProxy::new(&self.connection).await.ok()
    }

    async fn go_ready(&self) {
        self.go_unready().await;

        let Some(proxy) = self.service_proxy().await else {
            return;
        };
        let Ok(applications) = proxy.get_applications().await else {
            return;
        };

        *self.ready.lock().await = true;
        for description in applications {
            self.add_indicator(description).await;
        }

        let Ok(mut added) = proxy.receive_application_added().await else {
            return;
        };
        let Ok(mut removed) = proxy.receive_application_removed().await else {
            return;
        };
        let Ok(mut title_changed) = proxy.receive_application_title_changed().await else {
            return;
        };

        self.notify_changed();

        loop {
            tokio::select! {
                signal = futures::StreamExt::next(&mut added) => {
                    let Some(signal) = signal else { break };
                    if !*self.ready.lock().await { continue }
                    let Ok(args) = signal.args() else { continue };
                    self.add_indicator(args.description).await;
                    self.notify_changed();
                }
                signal = futures::StreamExt::next(&mut removed) => {
                    let Some(signal) = signal else { break };
                    if !*self.ready.lock().await { continue }
                    let Ok(args) = signal.args() else { continue };
                    if self.remove_indicator(args.position).await.is_err() {
                        tracing::warn!(position = args.position, "ApplicationRemoved out of range, resynchronising");
                        Box::pin(self.go_ready()).await;
                        return;
                    }
                    self.notify_changed();
                }
                signal = futures::StreamExt::next(&mut title_changed) => {
                    let Some(_signal) = signal else { break };
                    // Title changes only affect display prefix, already
                    // baked into the collector at construction; nothing
                    // further to do without a collector-level rename hook.
                }
            }
        }
    }

    async fn go_unready(&self) {
        *self.ready.lock().await = false;
        let mut entries = self.entries.lock().await;
        let in_use = *self.use_count.lock().unwrap() > 0;
        for entry in entries.drain(..) {
            entry.relay_cancel.cancel();
            if in_use {
                entry.collector.unuse().await;
            }
        }
    }

    async fn add_indicator(&self, description: ApplicationDescription) {
        let (icon_name, position, bus_name, object_path, _, _, _, _, id, title) = description;
        let title = if title.is_empty() {
            format!("Untitled Indicator ({id})")
        } else {
            title
        };
        let app_icon_name = (!icon_name.is_empty()).then(|| Arc::from(icon_name.as_str()));

        tracing::debug!(id = %id, %position, %title, %bus_name, %icon_name, "adding appindicator");

        let collector = DbusmenuCollector::new(
            self.connection.clone(),
            bus_name,
            object_path.to_string(),
            title,
            app_icon_name,
            self.indicator_penalty,
        )
        .await as Arc<dyn Source>;

        if *self.use_count.lock().unwrap() > 0 {
            collector.use_().await;
        }

        let relay_cancel = CancellationToken::new();
        relay_changed(collector.clone(), self.changed_tx.clone(), relay_cancel.clone());

        let mut entries = self.entries.lock().await;
        let index = (position as usize).min(entries.len());
        entries.insert(index, Entry { collector, relay_cancel });
    }

    async fn remove_indicator(&self, position: i32) -> Result<(), ()> {
        let mut entries = self.entries.lock().await;
        if position < 0 || position as usize >= entries.len() {
            return Err(());
        }
        let entry = entries.remove(position as usize);
        drop(entries);
        entry.relay_cancel.cancel();
        if *self.use_count.lock().unwrap() > 0 {
            entry.collector.unuse().await;
        }
        Ok(())
    }

    fn notify_changed(&self) {
        let _ = self.changed_tx.send(());
    }
}

impl Drop for AppIndicatorSource {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
        if let Ok(entries) = self.entries.try_lock() {
            for entry in entries.iter() {
                entry.relay_cancel.cancel();
            }
        }
    }
}

#[async_trait]
impl Source for AppIndicatorSource {
    async fn use_(&self) {
        let mut count = self.use_count.lock().unwrap();
        *count += 1;
        let was_zero = *count == 1;
        drop(count);

        if was_zero {
            let entries = self.entries.lock().await;
            for entry in entries.iter() {
                entry.collector.use_().await;
            }
        }
    }

    async fn unuse(&self) {
        let mut count = self.use_count.lock().unwrap();
        if *count == 0 {
            return;
        }
        *count -= 1;
        let reached_zero = *count == 0;
        drop(count);

        if reached_zero {
            let entries = self.entries.lock().await;
            for entry in entries.iter() {
                entry.collector.unuse().await;
            }
        }
    }

    async fn search(&self, query: &TokenList, out: &mut Vec<MatchResult>) {
        let entries = self.entries.lock().await;
        for entry in entries.iter() {
            entry.collector.search(query, out).await;
        }
    }

    fn changed(&self) -> ChangedStream {
        let rx = self.changed_tx.subscribe();
        Box::pin(futures::StreamExt::filter_map(
            BroadcastStream::new(rx),
            |event| async move { event.ok() },
        ))
    }
}
