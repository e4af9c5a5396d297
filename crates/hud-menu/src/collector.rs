//! Shared scaffolding for collector variants: use-count, mirrored items,
//! penalty adjustment and the `changed` broadcast.

use std::sync::{Arc, Mutex};

use hud_distance::{Penalties, TokenList, distance};
use hud_source::{ChangedStream, Item, MatchResult, Source};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Shared state every collector variant embeds.
pub(crate) struct CollectorCore {
    /// Percentage added to every distance this collector produces.
    pub penalty: u32,
    pub items: Mutex<Vec<Arc<Item>>>,
    pub use_count: Mutex<u32>,
    pub in_error: Mutex<bool>,
    changed_tx: broadcast::Sender<()>,
}

impl CollectorCore {
    pub fn new(penalty: u32) -> Self {
        let (changed_tx, _) = broadcast::channel(16);
        Self {
            penalty,
            items: Mutex::new(Vec::new()),
            use_count: Mutex::new(0),
            in_error: Mutex::new(false),
            changed_tx,
        }
    }

    pub fn replace_items(&self, items: Vec<Arc<Item>>) {
        *self.items.lock().unwrap() = items;
        self.notify_changed();
    }

    pub fn notify_changed(&self) {
        let _ = self.changed_tx.send(());
    }

    pub fn changed_stream(&self) -> ChangedStream {
        let rx = self.changed_tx.subscribe();
        Box::pin(futures::StreamExt::filter_map(
            BroadcastStream::new(rx),
            |event| async move { event.ok() },
        ))
    }

    pub fn mark_error(&self, in_error: bool) {
        *self.in_error.lock().unwrap() = in_error;
    }

    pub async fn search_mirrored(&self, query: &TokenList, out: &mut Vec<MatchResult>) {
        let penalties = Penalties::default();
        let items: Vec<_> = self.items.lock().unwrap().clone();

        for item in items {
            let mut matched = Vec::new();
            let raw = distance(item.tokens(), query, &penalties, Some(&mut matched));
            if raw == hud_distance::SENTINEL || raw > penalties.max_distance {
                continue;
            }
            let adjusted = raw + raw * self.penalty / 100;
            out.push(MatchResult::new(item, adjusted, matched));
        }
    }

    /// 0→1 / 1→0 edge detection for use()/unuse(); returns whether the
    /// transition crossed the boundary.
    pub fn transition_use(&self) -> bool {
        let mut count = self.use_count.lock().unwrap();
        *count += 1;
        *count == 1
    }

    pub fn transition_unuse(&self) -> bool {
        let mut count = self.use_count.lock().unwrap();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        *count == 0
    }
}

