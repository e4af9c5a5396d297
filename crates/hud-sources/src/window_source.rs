//! Routes searches to whichever collector belongs to the focused window.

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hud_distance::TokenList;
use hud_menu::DbusmenuCollector;
use hud_source::{ChangedStream, MatchResult, Source, relay_changed};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use zbus::Connection;

use crate::active_window::ActiveWindowWatcher;
use crate::proxy::AppMenuRegistrarProxy;

/// Window titles that must never become the active collector, regardless
/// of focus (the HUD's own window chief among them).
const STATIC_BLOCKLIST: &[&str] = &["indicator-appmenu-hud", "Hud"];

/// A window the registrar has no menu for is cached as `None` so repeated
/// focus events don't re-issue the lookup.
type CollectorSlot = Option<Arc<dyn Source>>;

pub struct WindowSource {
    connection: Connection,
    collectors: Mutex<HashMap<u32, CollectorSlot>>,
    active: Mutex<Option<u32>>,
    blocklist: Vec<String>,
    use_count: Mutex<u32>,
    changed_tx: broadcast::Sender<()>,
    /// Cancels the task relaying the currently-active collector's own
    /// `changed()` into `changed_tx`, replaced on every focus change.
    active_relay: Mutex<Option<CancellationToken>>,
    cancellation_token: CancellationToken,
}

impl WindowSource {
    pub fn new(connection: Connection, watcher: Arc<dyn ActiveWindowWatcher>) -> Arc<Self> {
        let mut blocklist: Vec<String> = STATIC_BLOCKLIST.iter().map(|s| s.to_string()).collect();
        if let Ok(extra) = env::var("HUD_WINDOW_BLOCKLIST") {
            blocklist.extend(extra.split(',').filter(|s| !s.is_empty()).map(String::from));
        }

        let (changed_tx, _) = broadcast::channel(16);
        let source = Arc::new(Self {
            connection,
            collectors: Mutex::new(HashMap::new()),
            active: Mutex::new(None),
            blocklist,
            use_count: Mutex::new(0),
            changed_tx,
            active_relay: Mutex::new(None),
            cancellation_token: CancellationToken::new(),
        });

        let weak = Arc::downgrade(&source);
        let token = source.cancellation_token.clone();
        tokio::spawn(async move {
            let mut changes = watcher.changes();
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = futures::StreamExt::next(&mut changes) => {
                        let Some(event) = event else { break };
                        let Some(source) = weak.upgrade() else { break };
                        source.on_focus_change(event).await;
                    }
                }
            }
        });

        source
    }

    fn is_blocked(&self, title: &str) -> bool {
        self.blocklist.iter().any(|blocked| title.contains(blocked.as_str()))
    }

    async fn on_focus_change(&self, window: Option<crate::active_window::ActiveWindow>) {
        let target_id = match &window {
            Some(window) if !self.is_blocked(&window.title) => Some(window.id),
            _ => None,
        };

        let new_collector = match target_id {
            Some(id) => self.collector_for(id).await,
            None => None,
        };

        let previous_id = {
            let mut active = self.active.lock().unwrap();
            std::mem::replace(&mut *active, target_id)
        };

        let in_use = *self.use_count.lock().unwrap() > 0;
        if in_use {
            if let Some(previous_id) = previous_id {
                if let Some(collector) = self.collectors.lock().unwrap().get(&previous_id).cloned().flatten() {
                    collector.unuse().await;
                }
            }
            if let Some(collector) = &new_collector {
                collector.use_().await;
            }
        }

        if let Some(previous_relay) = self.active_relay.lock().unwrap().take() {
            previous_relay.cancel();
        }
        if let Some(collector) = &new_collector {
            let relay_cancel = CancellationToken::new();
            relay_changed(collector.clone(), self.changed_tx.clone(), relay_cancel.clone());
            *self.active_relay.lock().unwrap() = Some(relay_cancel);
        }

        let _ = self.changed_tx.send(());
    }

    /// Looks up (or lazily builds) the collector for `window_id`, caching
    /// the result including the "no menu" case.
    async fn collector_for(&self, window_id: u32) -> CollectorSlot {
        if let Some(cached) = self.collectors.lock().unwrap().get(&window_id) {
            return cached.clone();
        }

        let slot = self.build_collector(window_id).await;
        self.collectors.lock().unwrap().insert(window_id, slot.clone());
        slot
    }

    async fn build_collector(&self, window_id: u32) -> CollectorSlot {
        let registrar = AppMenuRegistrarProxy::new(&self.connection).await.ok()?;
        let (bus_name, object_path) = registrar.get_menu_for_window(window_id).await.ok()?;
        if bus_name.is_empty() {
            return None;
        }

        let collector = DbusmenuCollector::new(
            self.connection.clone(),
            bus_name,
            object_path.to_string(),
            format!("window:{window_id}"),
            None,
            0,
        )
        .await;
        Some(collector as Arc<dyn Source>)
    }
}

impl Drop for WindowSource {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(relay) = self.active_relay.lock().unwrap().take() {
            relay.cancel();
        }
    }
}

#[async_trait]
impl Source for WindowSource {
    async fn use_(&self) {
        let mut count = self.use_count.lock().unwrap();
        *count += 1;
        let was_zero = *count == 1;
        drop(count);

        if was_zero {
            if let Some(collector) = self.current_collector() {
                collector.use_().await;
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
            if let Some(collector) = self.current_collector() {
                collector.unuse().await;
            }
        }
    }

    async fn search(&self, query: &TokenList, out: &mut Vec<MatchResult>) {
        if let Some(collector) = self.current_collector() {
            collector.search(query, out).await;
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

impl WindowSource {
    fn current_collector(&self) -> CollectorSlot {
        let active_id = (*self.active.lock().unwrap())?;
        self.collectors.lock().unwrap().get(&active_id).cloned().flatten()
    }
}
