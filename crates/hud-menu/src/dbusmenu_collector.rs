//! Collector for the `com.canonical.dbusmenu` protocol.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hud_distance::TokenList;
use hud_source::{ActivationError, ActivationHandle, MatchResult, Source};
use tokio_util::sync::CancellationToken;
use zbus::Connection;
use zbus::zvariant::Value;

use crate::collector::CollectorCore;
use crate::error::Error;
use crate::mirror::flatten;
use crate::proxy::DBusMenuProxy;
use crate::types::MenuNode;

/// Mirrors one remote menu tree reached via the dbusmenu interface at
/// `(bus_name, object_path)`.
pub struct DbusmenuCollector {
    core: CollectorCore,
    connection: Connection,
    bus_name: Arc<str>,
    object_path: Arc<str>,
    application_id: Arc<str>,
    app_icon_name: Option<Arc<str>>,
    cancellation_token: CancellationToken,
}

impl DbusmenuCollector {
    /// Subscribes to `LayoutUpdated`, fetches the initial layout and
    /// builds the mirror. The object is immediately usable; the initial
    /// fetch runs on the executor and a `changed` follows once it lands.
    /// `app_icon_name` is attached to every item this collector produces.
    pub async fn new(
        connection: Connection,
        bus_name: impl Into<Arc<str>>,
        object_path: impl Into<Arc<str>>,
        application_id: impl Into<Arc<str>>,
        app_icon_name: Option<Arc<str>>,
        penalty: u32,
    ) -> Arc<Self> {
        let collector = Arc::new(Self {
            core: CollectorCore::new(penalty),
            connection,
            bus_name: bus_name.into(),
            object_path: object_path.into(),
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
                tracing::warn!(%error, "initial dbusmenu layout fetch failed");
            }

            let Ok(proxy) = collector.proxy().await else {
                return;
            };
            let Ok(mut signals) = proxy.receive_layout_updated().await else {
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
                            tracing::warn!(%error, "dbusmenu re-layout failed");
                        }
                    }
                }
            }
        });

        collector
    }

    async fn proxy(&self) -> Result<DBusMenuProxy<'static>, Error> {
        DBusMenuProxy::builder(&self.connection)
            .destination(self.bus_name.as_ref())?
            .path(self.object_path.as_ref())?
            .build()
            .await
            .map_err(Error::from)
    }

    /// Discards the current mirror, re-fetches the layout, re-flattens and
    /// emits `changed`. Subscribers must treat previously held Items from
    /// this collector as stale as soon as this runs.
    async fn refresh(&self) -> Result<(), Error> {
        let proxy = self.proxy().await?;
        let (_, root_node) = proxy.get_layout(0, -1, Vec::new()).await.map_err(|e| {
            Error::Transport {
                service: self.bus_name.to_string(),
                reason: e.to_string(),
            }
        })?;

        let root = MenuNode::from_raw(root_node);
        let bus_name = self.bus_name.clone();
        let object_path = self.object_path.clone();
        let connection = self.connection.clone();

        let make_activation = move |id: i32| -> Arc<dyn ActivationHandle> {
            Arc::new(DbusmenuActivation {
                connection: connection.clone(),
                bus_name: bus_name.clone(),
                object_path: object_path.clone(),
                item_id: id,
            })
        };

        let items = flatten(&root, &self.application_id, self.app_icon_name.clone(), &make_activation);
        self.core.replace_items(items);
        self.core.mark_error(false);
        Ok(())
    }
}

impl Drop for DbusmenuCollector {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[async_trait]
impl Source for DbusmenuCollector {
    async fn use_(&self) {
        self.core.transition_use();
    }

    async fn unuse(&self) {
        self.core.transition_unuse();
    }

    async fn search(&self, query: &TokenList, out: &mut Vec<MatchResult>) {
        self.core.search_mirrored(query, out).await;
    }

    fn changed(&self) -> hud_source::ChangedStream {
        self.core.changed_stream()
    }
}

#[derive(Debug)]
struct DbusmenuActivation {
    connection: Connection,
    bus_name: Arc<str>,
    object_path: Arc<str>,
    item_id: i32,
}

#[async_trait]
impl ActivationHandle for DbusmenuActivation {
    /// Invokes `Event(id, "clicked", ..., timestamp)`, retrying once after
    /// a one-second delay on failure.
    async fn activate(&self, timestamp: u32) -> Result<(), ActivationError> {
        for attempt in 0..2 {
            let result = self.try_activate(timestamp).await;
            if result.is_ok() {
                return Ok(());
            }
            if attempt == 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
            } else {
                return result;
            }
        }
        unreachable!()
    }
}

impl DbusmenuActivation {
    async fn try_activate(&self, timestamp: u32) -> Result<(), ActivationError> {
        let proxy = DBusMenuProxy::builder(&self.connection)
            .destination(self.bus_name.as_ref())
            .map_err(|e| ActivationError::Remote(e.to_string()))?
            .path(self.object_path.as_ref())
            .map_err(|e| ActivationError::Remote(e.to_string()))?
            .build()
            .await
            .map_err(|e| ActivationError::Remote(e.to_string()))?;

        let data = zbus::zvariant::OwnedValue::try_from(Value::from(0i32))
            .map_err(|e| ActivationError::Remote(e.to_string()))?;

        proxy
            .event(self.item_id, "clicked", data, timestamp)
            .await
            .map_err(|e| ActivationError::Remote(e.to_string()))
    }
}
