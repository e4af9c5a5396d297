//! The `Source` capability every searchable component implements, and its
//! identity composition, [`SourceList`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hud_distance::TokenList;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;

use crate::result::MatchResult;

/// A stream of `changed` notifications. Coalescing multiple upstream
/// events into a single downstream emission is permitted.
pub type ChangedStream = std::pin::Pin<Box<dyn futures::Stream<Item = ()> + Send>>;

/// The capability every searchable component implements: menu collectors,
/// window/indicator sources, and the top-level source list itself.
#[async_trait]
pub trait Source: Send + Sync {
    /// Reference-counted activation. The first 0→1 transition must be
    /// forwarded downstream and may trigger a remote "HUD active" signal.
    async fn use_(&self);

    /// The matching 1→0 transition, forwarded downstream.
    async fn unuse(&self);

    /// Appends zero or more results whose distance is within
    /// `settings.max_distance` to `out`. At most one caller calls this
    /// concurrently on a given source.
    async fn search(&self, query: &TokenList, out: &mut Vec<MatchResult>);

    /// A stream that yields whenever a subsequent `search` for the same
    /// query could produce different results.
    fn changed(&self) -> ChangedStream;
}

/// A registered child plus the handle to the background task relaying its
/// own `changed()` stream into the owning list, for as long as the child
/// stays a member.
#[derive(Clone)]
struct ChildEntry {
    source: Arc<dyn Source>,
    relay_cancel: CancellationToken,
}

/// Broadcasts `use_`/`unuse`/`changed` to a set of children in registration
/// order; `search` fans out to each child in turn, preserving registration
/// order in the appended results.
pub struct SourceList {
    children: Mutex<Vec<ChildEntry>>,
    use_count: Mutex<u32>,
    changed_tx: broadcast::Sender<()>,
}

impl Default for SourceList {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceList {
    /// An empty source list.
    pub fn new() -> Self {
        let (changed_tx, _) = broadcast::channel(16);
        Self {
            children: Mutex::new(Vec::new()),
            use_count: Mutex::new(0),
            changed_tx,
        }
    }

    /// Registers a child source. If the list is already in use, the child
    /// is `use()`d before this call returns. A background task relays the
    /// child's own `changed()` stream into this list's `changed` for as
    /// long as it remains registered, so an in-place change to an
    /// already-mirrored child (not just a membership change) reaches
    /// standing queries.
    pub async fn add(&self, child: Arc<dyn Source>) {
        let in_use = *self.use_count.lock().unwrap() > 0;
        if in_use {
            child.use_().await;
        }

        let relay_cancel = CancellationToken::new();
        relay_changed(child.clone(), self.changed_tx.clone(), relay_cancel.clone());
        self.children.lock().unwrap().push(ChildEntry { source: child, relay_cancel });
    }

    /// Drops every registered child `Arc::ptr_eq` to `child`, cancelling its
    /// `changed` relay task. If the list is in use, each removed child is
    /// `unuse()`d first.
    pub async fn remove(&self, child: &Arc<dyn Source>) {
        let removed: Vec<_> = {
            let mut children = self.children.lock().unwrap();
            let mut removed = Vec::new();
            children.retain(|entry| {
                if Arc::ptr_eq(&entry.source, child) {
                    removed.push(entry.clone());
                    false
                } else {
                    true
                }
            });
            removed
        };

        for entry in &removed {
            entry.relay_cancel.cancel();
        }

        let in_use = *self.use_count.lock().unwrap() > 0;
        if in_use {
            for entry in removed {
                entry.source.unuse().await;
            }
        }
    }

    fn notify_changed(&self) {
        let _ = self.changed_tx.send(());
    }
}

#[async_trait]
impl Source for SourceList {
    async fn use_(&self) {
        let mut count = self.use_count.lock().unwrap();
        *count += 1;
        let was_zero = *count == 1;
        drop(count);

        if was_zero {
            let children: Vec<_> = self.children.lock().unwrap().iter().map(|e| e.source.clone()).collect();
            for child in children {
                child.use_().await;
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
            let children: Vec<_> = self.children.lock().unwrap().iter().map(|e| e.source.clone()).collect();
            for child in children {
                child.unuse().await;
            }
        }
    }

    async fn search(&self, query: &TokenList, out: &mut Vec<MatchResult>) {
        let children: Vec<_> = self.children.lock().unwrap().iter().map(|e| e.source.clone()).collect();
        for child in children {
            child.search(query, out).await;
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

impl Drop for SourceList {
    fn drop(&mut self) {
        if let Ok(children) = self.children.lock() {
            for entry in children.iter() {
                entry.relay_cancel.cancel();
            }
        }
    }
}

impl SourceList {
    /// Forwards a single `changed` from `self` upward, called by a
    /// background task watching each child's `changed` stream.
    pub fn forward_changed(&self) {
        self.notify_changed();
    }
}

/// Spawns a task that drains `source`'s `changed()` stream and re-sends
/// each event on `tx`, until `cancel` fires or the stream ends. Shared by
/// [`SourceList::add`] and the dynamic sources in `hud-sources` that track
/// a single active child outside a `SourceList` (`WindowSource`) or an
/// entry list of their own (`AppIndicatorSource`).
pub fn relay_changed(source: Arc<dyn Source>, tx: broadcast::Sender<()>, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut stream = source.changed();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = futures::StreamExt::next(&mut stream) => {
                    match event {
                        Some(()) => {
                            let _ = tx.send(());
                        }
                        None => break,
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct CountingSource {
        use_count: AtomicU32,
    }

    #[async_trait]
    impl Source for CountingSource {
        async fn use_(&self) {
            self.use_count.fetch_add(1, Ordering::SeqCst);
        }
        async fn unuse(&self) {
            self.use_count.fetch_sub(1, Ordering::SeqCst);
        }
        async fn search(&self, _query: &TokenList, _out: &mut Vec<MatchResult>) {}
        fn changed(&self) -> ChangedStream {
            Box::pin(futures::stream::empty())
        }
    }

    #[tokio::test]
    async fn adding_a_child_while_in_use_activates_it_immediately() {
        let list = SourceList::new();
        list.use_().await;

        let child = Arc::new(CountingSource {
            use_count: AtomicU32::new(0),
        });
        list.add(child.clone()).await;

        assert_eq!(child.use_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn removing_a_child_while_in_use_deactivates_it() {
        let list = SourceList::new();
        list.use_().await;

        let concrete = Arc::new(CountingSource {
            use_count: AtomicU32::new(0),
        });
        let child: Arc<dyn Source> = concrete.clone();
        list.add(child.clone()).await;
        assert_eq!(concrete.use_count.load(Ordering::SeqCst), 1);

        list.remove(&child).await;
        assert_eq!(concrete.use_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn adding_a_child_while_unused_does_not_activate_it() {
        let list = SourceList::new();
        let child = Arc::new(CountingSource {
            use_count: AtomicU32::new(0),
        });
        list.add(child.clone()).await;

        assert_eq!(child.use_count.load(Ordering::SeqCst), 0);
    }
}
