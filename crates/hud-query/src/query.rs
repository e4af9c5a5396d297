//! The ranking pipeline: binds a [`Source`], a [`UsageTracker`] and a search
//! string together, re-ranking by recency of use on every refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use hud_distance::tokenise;
use hud_source::{MatchResult, Source};
use hud_usage::UsageTracker;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;

use crate::error::ExecuteError;

/// A standing search against a [`Source`], re-ranked by usage frequency and
/// truncated to `num_results`. Construction activates `source`; dropping (or
/// [`Query::execute`]ing) it releases that activation.
pub struct Query {
    source: Arc<dyn Source>,
    usage: Arc<UsageTracker>,
    search_string: String,
    num_results: usize,
    results: Mutex<Vec<MatchResult>>,
    generation: AtomicU64,
    closed: Mutex<bool>,
    changed_tx: broadcast::Sender<()>,
    cancellation_token: CancellationToken,
}

impl Query {
    pub async fn new(
        source: Arc<dyn Source>,
        usage: Arc<UsageTracker>,
        search_string: impl Into<String>,
        num_results: usize,
    ) -> Arc<Self> {
        let (changed_tx, _) = broadcast::channel(16);
        let query = Arc::new(Self {
            source: source.clone(),
            usage,
            search_string: search_string.into(),
            num_results,
            results: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
            closed: Mutex::new(false),
            changed_tx,
            cancellation_token: CancellationToken::new(),
        });

        source.use_().await;
        query.refresh().await;

        let weak = Arc::downgrade(&query);
        let token = query.cancellation_token.clone();
        let mut upstream = source.changed();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = futures::StreamExt::next(&mut upstream) => {
                        if event.is_none() { break }
                        let Some(query) = weak.upgrade() else { break };
                        if *query.closed.lock().unwrap() { break }
                        query.refresh().await;
                    }
                }
            }
        });

        query
    }

    /// Current result snapshot, ranked ascending (best match first).
    pub fn results(&self) -> Vec<MatchResult> {
        self.results.lock().unwrap().clone()
    }

    /// A stream that yields whenever `results()` may have changed.
    pub fn changed(&self) -> tokio_stream::wrappers::BroadcastStream<()> {
        BroadcastStream::new(self.changed_tx.subscribe())
    }

    async fn refresh(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let mut results = Vec::new();
        if !self.search_string.is_empty() {
            let query_tokens = tokenise(&self.search_string);
            self.source.search(&query_tokens, &mut results).await;
        }

        let mut usages = Vec::with_capacity(results.len());
        let mut max_usage: u32 = 0;
        for result in &results {
            let item = result.item();
            let usage = self.usage.get_usage(item.application_id(), item.identifier()).await;
            max_usage = max_usage.max(usage);
            usages.push(usage);
        }

        let mut ranked: Vec<(u64, MatchResult)> = results
            .into_iter()
            .zip(usages)
            .enumerate()
            .map(|(order, (result, usage))| {
                let distance = result.distance() as u64;
                let penalty = if max_usage == 0 {
                    0
                } else {
                    distance * (max_usage - usage) as u64 / max_usage as u64
                };
                let rank = distance + penalty;
                // Pack `order` into the low bits so `sort_by_key` on a
                // single u64 also breaks ties by source-append order.
                ((rank << 32) | order as u64, result)
            })
            .collect();

        ranked.sort_by_key(|(key, _)| *key);
        ranked.truncate(self.num_results);

        *self.results.lock().unwrap() = ranked.into_iter().map(|(_, result)| result).collect();
        let _ = self.changed_tx.send(());
    }

    /// Dispatches the activation at `key` (an index into the last `results()`
    /// snapshot), marks usage on success, and closes this query.
    pub async fn execute(&self, key: usize, timestamp: u32) -> Result<(), ExecuteError> {
        if *self.closed.lock().unwrap() {
            return Err(ExecuteError::Closed);
        }

        let result = self
            .results
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or(ExecuteError::UnknownKey)?;

        let item = result.item().clone();
        if item.activate(timestamp).await.is_ok() {
            self.usage.mark_usage(item.application_id(), item.identifier()).await;
        }

        self.close().await;
        Ok(())
    }

    /// Releases the source activation and stops refreshing. Idempotent.
    pub async fn close(&self) {
        let mut closed = self.closed.lock().unwrap();
        if *closed {
            return;
        }
        *closed = true;
        drop(closed);

        self.cancellation_token.cancel();
        self.source.unuse().await;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use hud_distance::{StringList, TokenList, tokenise as tok};
    use hud_source::{ActivationError, ActivationHandle, ChangedStream, Item};

    use super::*;

    #[derive(Debug)]
    struct NullActivation;

    #[async_trait]
    impl ActivationHandle for NullActivation {
        async fn activate(&self, _timestamp: u32) -> Result<(), ActivationError> {
            Ok(())
        }
    }

    struct FixedSource {
        items: Vec<(Arc<hud_source::Item>, u32)>,
    }

    #[async_trait]
    impl Source for FixedSource {
        async fn use_(&self) {}
        async fn unuse(&self) {}
        async fn search(&self, _query: &TokenList, out: &mut Vec<MatchResult>) {
            for (item, distance) in &self.items {
                out.push(MatchResult::new(item.clone(), *distance, vec![]));
            }
        }
        fn changed(&self) -> ChangedStream {
            Box::pin(futures::stream::empty())
        }
    }

    fn item(label: &str, app: &str) -> Arc<Item> {
        Arc::new(Item::new(
            Arc::new(StringList::singleton(label)),
            tok(label),
            app,
            true,
            Arc::new(NullActivation),
            None,
            None,
        ))
    }

    #[tokio::test]
    async fn ties_break_by_source_append_order() {
        let a = item("File > Print", "a.desktop");
        let b = item("Edit > Preferences", "b.desktop");
        let source: Arc<dyn Source> = Arc::new(FixedSource {
            items: vec![(a.clone(), 3), (b.clone(), 3)],
        });
        let usage = Arc::new(UsageTracker::new(false).unwrap());

        let query = Query::new(source, usage, "pre", 10).await;
        let results = query.results();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].item().identifier(), a.identifier());
        assert_eq!(results[1].item().identifier(), b.identifier());
    }

    #[tokio::test]
    async fn more_used_items_rank_ahead_of_equal_distance_peers() {
        let a = item("File > Print", "a.desktop");
        let b = item("Edit > Preferences", "b.desktop");
        let source: Arc<dyn Source> = Arc::new(FixedSource {
            items: vec![(a.clone(), 4), (b.clone(), 4)],
        });
        let usage = Arc::new(UsageTracker::new(false).unwrap());
        for _ in 0..5 {
            usage.mark_usage(b.application_id(), b.identifier()).await;
        }

        let query = Query::new(source, usage, "pre", 10).await;
        let results = query.results();

        assert_eq!(results[0].item().identifier(), b.identifier());
        assert_eq!(results[1].item().identifier(), a.identifier());
    }

    #[tokio::test]
    async fn empty_search_string_yields_no_results() {
        let a = item("File > Print", "a.desktop");
        let source: Arc<dyn Source> = Arc::new(FixedSource {
            items: vec![(a, 0)],
        });
        let usage = Arc::new(UsageTracker::new(false).unwrap());

        let query = Query::new(source, usage, "", 10).await;
        assert!(query.results().is_empty());
    }

    #[tokio::test]
    async fn executing_an_unknown_key_is_rejected_without_closing() {
        let source: Arc<dyn Source> = Arc::new(FixedSource { items: vec![] });
        let usage = Arc::new(UsageTracker::new(false).unwrap());

        let query = Query::new(source, usage, "pre", 10).await;
        assert_eq!(query.execute(0, 0).await, Err(ExecuteError::UnknownKey));
    }

    #[tokio::test]
    async fn executing_twice_reports_closed() {
        let a = item("File > Print", "a.desktop");
        let source: Arc<dyn Source> = Arc::new(FixedSource {
            items: vec![(a, 0)],
        });
        let usage = Arc::new(UsageTracker::new(false).unwrap());

        let query = Query::new(source, usage, "pre", 10).await;
        assert!(query.execute(0, 0).await.is_ok());
        assert_eq!(query.execute(0, 0).await, Err(ExecuteError::Closed));
    }
}
