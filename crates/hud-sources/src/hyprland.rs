//! Hyprland compositor integration for [`ActiveWindowWatcher`], grounded on
//! the event-socket protocol: a newline-delimited `EVENT>>DATA` stream at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket2.sock`.

use std::collections::hash_map::DefaultHasher;
use std::env;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::active_window::{ActiveWindow, ActiveWindowWatcher};

fn socket_path() -> Option<PathBuf> {
    let signature = env::var("HYPRLAND_INSTANCE_SIGNATURE").ok()?;
    let runtime_dir = env::var("XDG_RUNTIME_DIR").ok()?;
    Some(PathBuf::from(format!(
        "{runtime_dir}/hypr/{signature}/.socket2.sock"
    )))
}

fn stable_id(seed: &str) -> u32 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    hasher.finish() as u32
}

/// Parses one event line. Returns `None` for events this watcher does not
/// track, `Some(None)` for "nothing focused", `Some(Some(window))`
/// otherwise. `activewindowv2` carries only the window address, which
/// stands in as both the id seed and the display title for the blocklist
/// check.
fn parse_line(line: &str) -> Option<Option<ActiveWindow>> {
    let (event, data) = line.split_once(">>")?;
    match event {
        "activewindow" => {
            if data == "," {
                return Some(None);
            }
            let (class, title) = data.split_once(',')?;
            Some(Some(ActiveWindow {
                id: stable_id(class),
                title: title.to_string(),
            }))
        }
        "activewindowv2" => {
            if data.is_empty() {
                return Some(None);
            }
            Some(Some(ActiveWindow {
                id: stable_id(data),
                title: data.to_string(),
            }))
        }
        _ => None,
    }
}

/// Watches Hyprland's event socket for `activewindow`/`activewindowv2`.
pub struct HyprlandActiveWindowWatcher {
    tx: broadcast::Sender<Option<ActiveWindow>>,
}

impl HyprlandActiveWindowWatcher {
    /// Spawns the socket-reading task and returns immediately. Reconnects
    /// with a fixed backoff if Hyprland isn't running yet or the
    /// connection drops.
    pub fn connect() -> Self {
        let (tx, _) = broadcast::channel(16);
        let task_tx = tx.clone();
        tokio::spawn(async move {
            loop {
                let Some(path) = socket_path() else {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                };
                match UnixStream::connect(&path).await {
                    Ok(stream) => {
                        let mut lines = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = lines.next_line().await {
                            if let Some(event) = parse_line(&line) {
                                let _ = task_tx.send(event);
                            }
                        }
                    }
                    Err(error) => {
                        tracing::debug!(%error, "hyprland event socket unavailable");
                    }
                }
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        });
        Self { tx }
    }
}

impl ActiveWindowWatcher for HyprlandActiveWindowWatcher {
    fn changes(&self) -> Pin<Box<dyn Stream<Item = Option<ActiveWindow>> + Send>> {
        let rx = self.tx.subscribe();
        Box::pin(futures::StreamExt::filter_map(
            BroadcastStream::new(rx),
            |event| async move { event.ok() },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_activewindow_event() {
        let parsed = parse_line("activewindow>>firefox,Mozilla Firefox");
        assert_eq!(parsed.unwrap().unwrap().title, "Mozilla Firefox");
    }

    #[test]
    fn empty_activewindow_means_no_focus() {
        assert_eq!(parse_line("activewindow>>,"), Some(None));
    }

    #[test]
    fn unrelated_events_are_ignored() {
        assert_eq!(parse_line("workspace>>3"), None);
    }

    #[test]
    fn same_class_hashes_to_the_same_id() {
        let a = parse_line("activewindow>>code,main.rs").unwrap().unwrap();
        let b = parse_line("activewindow>>code,other.rs").unwrap().unwrap();
        assert_eq!(a.id, b.id);
    }
}
