//! A synthetic [`Source`] used only in development, gated by
//! `HUD_DEBUG_SOURCE`.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use hud_distance::{StringList, TokenList, distance, tokenise, tokenise_path};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;

use crate::item::{ActivationError, ActivationHandle, Item};
use crate::result::MatchResult;
use crate::source::{ChangedStream, Source};

#[derive(Debug)]
struct NoopActivation;

#[async_trait]
impl ActivationHandle for NoopActivation {
    async fn activate(&self, _timestamp: u32) -> Result<(), ActivationError> {
        Ok(())
    }
}

/// Emits a single item carrying the current date/time, refreshed every
/// second. Never registered unless `HUD_DEBUG_SOURCE` is set.
pub struct DebugSource {
    current: Mutex<Arc<Item>>,
    changed_tx: broadcast::Sender<()>,
    cancellation_token: CancellationToken,
}

impl DebugSource {
    /// Spawns the per-second refresh task and returns the source.
    pub fn new(penalties: hud_distance::Penalties) -> Arc<Self> {
        let (changed_tx, _) = broadcast::channel(16);
        let source = Arc::new(Self {
            current: Mutex::new(Arc::new(make_item())),
            changed_tx,
            cancellation_token: CancellationToken::new(),
        });

        let weak = Arc::downgrade(&source);
        let token = source.cancellation_token.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(source) = weak.upgrade() else { break };
                        *source.current.lock().unwrap() = Arc::new(make_item());
                        let _ = source.changed_tx.send(());
                        let _ = penalties; // captured for future per-tick re-scoring, currently unused
                    }
                }
            }
        });

        source
    }
}

fn make_item() -> Item {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let label = format!("Debug clock: {now}");
    let path = Arc::new(StringList::singleton(label.clone()));
    Item::new(
        path,
        tokenise(&label),
        "hud-debug-source",
        true,
        Arc::new(NoopActivation),
        Some(Arc::from("utilities-terminal")),
        None,
    )
}

impl Drop for DebugSource {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[async_trait]
impl Source for DebugSource {
    async fn use_(&self) {}
    async fn unuse(&self) {}

    async fn search(&self, query: &TokenList, out: &mut Vec<MatchResult>) {
        let item = self.current.lock().unwrap().clone();
        let penalties = hud_distance::Penalties::default();
        let path_tokens = tokenise_path(item.path());
        let mut matched = Vec::new();
        let d = distance(&path_tokens, query, &penalties, Some(&mut matched));
        if d <= penalties.max_distance {
            out.push(MatchResult::new(item, d, matched));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_matches_the_current_clock_item() {
        let source = DebugSource::new(hud_distance::Penalties::default());
        let mut out = Vec::new();
        source.search(&tokenise("debug"), &mut out).await;
        assert_eq!(out.len(), 1);
    }
}
