//! The window-manager integration point `WindowSource` is built against.
//!
//! The reference implementation reads this off the X11 root window's
//! `_NET_ACTIVE_WINDOW` property via Wnck. Nothing in the corpus plays that
//! role, so this is a capability boundary instead: any compositor can
//! report focus changes by implementing [`ActiveWindowWatcher`]. One
//! concrete implementation, [`HyprlandActiveWindowWatcher`], is provided.

use std::pin::Pin;

use futures::Stream;

/// The window currently holding input focus, or enough of it to key a
/// collector and check the blocklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWindow {
    /// A stable id for this window, scoped to the watcher's lifetime.
    pub id: u32,
    /// The window's title or class, checked against the blocklist.
    pub title: String,
}

/// A source of focus-change notifications. Emits `None` when focus moves
/// to a window this watcher can't describe (or nothing is focused at all).
pub trait ActiveWindowWatcher: Send + Sync {
    fn changes(&self) -> Pin<Box<dyn Stream<Item = Option<ActiveWindow>> + Send>>;
}
