//! Collector for the GLib menu-model export protocol
//! (`org.gtk.Menus` + `org.gtk.Actions`).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hud_distance::{TokenList, tokenise_path};
use hud_source::{ActivationError, ActivationHandle, MatchResult, Source};
use tokio_util::sync::CancellationToken;
use zbus::Connection;
use zbus::zvariant::OwnedValue;

use crate::collector::CollectorCore;
use crate::error::Error;
use crate::menu_model_mirror::{GroupFetcher, resolve};
use crate::proxy::{GtkActionsProxy, GtkMenusProxy, HudAwarenessProxy};

/// Mirrors one remote menu model at `menu_path`, dispatching activation to
/// whichever action group an item's `action` string names by prefix
/// (`"app.quit"` dispatches via the `"app"` entry of `action_paths`).
pub struct MenuModelCollector {
    core: CollectorCore,
    connection: Connection,
    bus_name: Arc<str>,
    menu_path: Arc<str>,
    action_paths: HashMap<String, Arc<str>>,
    application_id: Arc<str>,
    app_icon_name: Option<Arc<str>>,
    cancellation_token: CancellationToken,
}

impl MenuModelCollector {
    /// `action_paths` maps an action-group prefix (`"app"`, `"win"`, ...) to
    /// the object path exporting it; all action groups are assumed to live
    /// on `bus_name`. `app_icon_name` is attached to every item produced.
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        connection: Connection,
        bus_name: impl Into<Arc<str>>,
        menu_path: impl Into<Arc<str>>,
        action_paths: HashMap<String, Arc<str>>,
        application_id: impl Into<Arc<str>>,
        app_icon_name: Option<Arc<str>>,
        penalty: u32,
    ) -> Arc<Self> {
        let collector = Arc::new(Self {
            core: CollectorCore::new(penalty),
            connection,
            bus_name: bus_name.into(),
            menu_path: menu_path.into(),
            action_paths,
            application_id: application_id.into(),
            app_icon_name,
            cancellation_token: CancellationToken::new(),
        });

        let weak = Arc::downgrade(&collector);
        let token = collector.cancellation_token.clone();
        tokio::spawn(async move {
            let Some(collector) = weak.upgrade() else {
                return;
            };
            if let Err(error) = collector.refresh().await {
                tracing::warn!(%error, "initial menu-model fetch failed");
            }

            let Ok(proxy) = collector.menus_proxy().await else {
                return;
            };
            let Ok(mut signals) = proxy.receive_changed().await else {
                return;
            };

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    signal = futures::StreamExt::next(&mut signals) => {
                        if signal.is_none() {
                            break;
                        }
                        let Some(collector) = weak.upgrade() else { break };
                        if let Err(error) = collector.refresh().await {
                            tracing::warn!(%error, "menu-model re-fetch failed");
                        }
                    }
                }
            }
        });

        collector
    }

    async fn menus_proxy(&self) -> Result<GtkMenusProxy<'static>, Error> {
        GtkMenusProxy::builder(&self.connection)
            .destination(self.bus_name.as_ref())?
            .path(self.menu_path.as_ref())?
            .build()
            .await
            .map_err(Error::from)
    }

    async fn refresh(&self) -> Result<(), Error> {
        let proxy = self.menus_proxy().await?;
        let bus_name = self.bus_name.clone();

        let fetch: GroupFetcher = Arc::new(move |group| {
            let proxy = proxy.clone();
            Box::pin(async move { proxy.start(vec![group]).await.ok() })
        });

        let resolved = resolve(fetch).await;

        let connection = self.connection.clone();
        let action_paths = self.action_paths.clone();
        let application_id = self.application_id.clone();

        let mut items = Vec::with_capacity(resolved.len());
        for entry in resolved {
            let tokens = tokenise_path(&entry.path);
            if tokens.is_empty() {
                continue;
            }

            let Some((prefix, name)) = entry.action.split_once('.') else {
                continue;
            };
            let Some(action_path) = action_paths.get(prefix) else {
                continue;
            };

            let activation: Arc<dyn ActivationHandle> = Arc::new(MenuModelActivation {
                connection: connection.clone(),
                bus_name: bus_name.clone(),
                action_path: action_path.clone(),
                action_name: name.to_string(),
                target: entry.target.clone(),
            });

            let item_icon_name = entry.icon_name.as_deref().map(Arc::from);
            let item = hud_source::Item::new(
                entry.path,
                tokens,
                application_id.clone(),
                entry.enabled,
                activation,
                self.app_icon_name.clone(),
                item_icon_name,
            );
            items.push(Arc::new(item));
        }

        self.core.replace_items(items);
        self.core.mark_error(false);
        Ok(())
    }

    /// Probes the remote for HUD awareness and, if present, emits
    /// `HudActiveChanged` so it can pre-populate or clean up transient UI.
    async fn notify_awareness(&self, active: bool) {
        let Ok(proxy) = HudAwarenessProxy::builder(&self.connection)
            .destination(self.bus_name.as_ref())
            .and_then(|b| b.path(self.menu_path.as_ref()))
        else {
            return;
        };
        let Ok(proxy) = proxy.build().await else {
            return;
        };
        if proxy.check_awareness().await.is_err() {
            return;
        }

        let result = self
            .connection
            .emit_signal(
                Some(self.bus_name.as_ref()),
                self.menu_path.as_ref(),
                "com.canonical.hud.Awareness",
                "HudActiveChanged",
                &active,
            )
            .await;
        if let Err(error) = result {
            tracing::warn!(%error, bus_name = %self.bus_name, "failed to emit HudActiveChanged");
        }
    }
}

impl Drop for MenuModelCollector {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[async_trait]
impl Source for MenuModelCollector {
    async fn use_(&self) {
        if self.core.transition_use() {
            self.notify_awareness(true).await;
        }
    }

    async fn unuse(&self) {
        if self.core.transition_unuse() {
            self.notify_awareness(false).await;
        }
    }

    async fn search(&self, query: &TokenList, out: &mut Vec<MatchResult>) {
        self.core.search_mirrored(query, out).await;
    }

    fn changed(&self) -> hud_source::ChangedStream {
        self.core.changed_stream()
    }
}

#[derive(Debug)]
struct MenuModelActivation {
    connection: Connection,
    bus_name: Arc<str>,
    action_path: Arc<str>,
    action_name: String,
    target: Option<OwnedValue>,
}

#[async_trait]
impl ActivationHandle for MenuModelActivation {
    async fn activate(&self, timestamp: u32) -> Result<(), ActivationError> {
        let proxy = GtkActionsProxy::builder(&self.connection)
            .destination(self.bus_name.as_ref())
            .map_err(|e| ActivationError::Remote(e.to_string()))?
            .path(self.action_path.as_ref())
            .map_err(|e| ActivationError::Remote(e.to_string()))?
            .build()
            .await
            .map_err(|e| ActivationError::Remote(e.to_string()))?;

        let parameter = self.target.clone().into_iter().collect();
        let mut platform_data = HashMap::new();
        platform_data.insert(
            "timestamp".to_string(),
            OwnedValue::try_from(zbus::zvariant::Value::from(timestamp))
                .map_err(|e| ActivationError::Remote(e.to_string()))?,
        );

        proxy
            .activate(&self.action_name, parameter, platform_data)
            .await
            .map_err(|e| ActivationError::Remote(e.to_string()))
    }
}
