//! `IndicatorSource`: a fixed, compile-time list of well-known system
//! indicators, each brought up as a [`DbusmenuCollector`] once its bus name
//! appears and torn down once it vanishes.

use std::sync::Arc;

use async_trait::async_trait;
use hud_distance::TokenList;
use hud_menu::DbusmenuCollector;
use hud_source::{ChangedStream, MatchResult, Source, SourceList};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use zbus::{Connection, fdo::DBusProxy};

struct IndicatorInfo {
    bus_name: &'static str,
    menu_object_path: &'static str,
    display_prefix: &'static str,
    icon_name: &'static str,
}

const INDICATORS: &[IndicatorInfo] = &[
    IndicatorInfo {
        bus_name: "com.canonical.indicator.datetime",
        menu_object_path: "/com/canonical/indicator/datetime/menu",
        display_prefix: "Date",
        icon_name: "office-calendar",
    },
    IndicatorInfo {
        bus_name: "com.canonical.indicator.session",
        menu_object_path: "/com/canonical/indicator/session/menu",
        display_prefix: "Device",
        icon_name: "system-shutdown",
    },
    IndicatorInfo {
        bus_name: "com.canonical.indicator.session",
        menu_object_path: "/com/canonical/indicator/users/menu",
        display_prefix: "Users",
        icon_name: "avatar-default",
    },
    IndicatorInfo {
        bus_name: "com.canonical.indicator.sound",
        menu_object_path: "/com/canonical/indicator/sound/menu",
        display_prefix: "Sound",
        icon_name: "audio-volume-high",
    },
    IndicatorInfo {
        bus_name: "com.canonical.indicator.messages",
        menu_object_path: "/com/canonical/indicator/messages/menu",
        display_prefix: "Messages",
        icon_name: "indicator-messages",
    },
];

/// Delegates to a [`SourceList`] whose membership tracks which of the
/// fixed [`INDICATORS`] entries currently has a bus-name owner; the list's
/// `use`/`unuse`/`search` are reused unmodified, with `changed` forwarded
/// manually on every bring-up/tear-down.
pub struct IndicatorSource {
    list: Arc<SourceList>,
    present: Mutex<Vec<Option<Arc<dyn Source>>>>,
    cancellation_token: CancellationToken,
}

impl IndicatorSource {
    pub fn new(connection: Connection, indicator_penalty: u32) -> Arc<Self> {
        let source = Arc::new(Self {
            list: Arc::new(SourceList::new()),
            present: Mutex::new((0..INDICATORS.len()).map(|_| None).collect()),
            cancellation_token: CancellationToken::new(),
        });

        let weak = Arc::downgrade(&source);
        let token = source.cancellation_token.clone();
        tokio::spawn(async move {
            let Ok(dbus_proxy) = DBusProxy::new(&connection).await else {
                return;
            };

            for (index, info) in INDICATORS.iter().enumerate() {
                let Ok(name) = zbus::names::BusName::try_from(info.bus_name) else {
                    continue;
                };
                if let Ok(true) = dbus_proxy.name_has_owner(name).await {
                    let Some(source) = weak.upgrade() else { return };
                    source.bring_up(index, &connection, indicator_penalty).await;
                }
            }

            let Ok(mut name_owner_changed) = dbus_proxy.receive_name_owner_changed().await else {
                return;
            };

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    signal = futures::StreamExt::next(&mut name_owner_changed) => {
                        let Some(signal) = signal else { break };
                        let Some(source) = weak.upgrade() else { break };
                        let Ok(args) = signal.args() else { continue };

                        for (index, info) in INDICATORS.iter().enumerate() {
                            if args.name.as_str() != info.bus_name {
                                continue;
                            }
                            if args.new_owner.is_some() {
                                source.bring_up(index, &connection, indicator_penalty).await;
                            } else {
                                source.tear_down(index).await;
                            }
                        }
                    }
                }
            }
        });

        source
    }

    async fn bring_up(&self, index: usize, connection: &Connection, indicator_penalty: u32) {
        {
            let present = self.present.lock().await;
            if present[index].is_some() {
                return;
            }
        }

        let info = &INDICATORS[index];
        let collector = DbusmenuCollector::new(
            connection.clone(),
            info.bus_name,
            info.menu_object_path,
            info.display_prefix,
            Some(Arc::from(info.icon_name)),
            indicator_penalty,
        )
        .await as Arc<dyn Source>;
        self.list.add(collector.clone()).await;
        self.present.lock().await[index] = Some(collector);
        self.list.forward_changed();
    }

    async fn tear_down(&self, index: usize) {
        let removed = self.present.lock().await[index].take();
        if let Some(collector) = removed {
            self.list.remove(&collector).await;
            self.list.forward_changed();
        }
    }
}

#[async_trait]
impl Source for IndicatorSource {
    async fn use_(&self) {
        self.list.use_().await;
    }

    async fn unuse(&self) {
        self.list.unuse().await;
    }

    async fn search(&self, query: &TokenList, out: &mut Vec<MatchResult>) {
        self.list.search(query, out).await;
    }

    fn changed(&self) -> ChangedStream {
        self.list.changed()
    }
}

impl Drop for IndicatorSource {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
