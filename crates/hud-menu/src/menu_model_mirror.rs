//! Resolves a menu-model group graph (`org.gtk.Menus`' recursive
//! section/submenu links) into a flat list of matchable items.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use hud_distance::StringList;
use zbus::zvariant::OwnedValue;

use crate::proxy::MenuModelRow;

/// Nested submenus deeper than this are treated as a misbehaving exporter
/// and the walk stops descending, rather than risking unbounded recursion.
const MAX_DEPTH: u32 = 16;

/// A leaf action item resolved from the group graph, with its full display
/// path (sections contribute no path segment; submenus contribute their
/// own label).
pub(crate) struct ResolvedItem {
    pub path: Arc<StringList>,
    pub action: String,
    pub target: Option<OwnedValue>,
    pub enabled: bool,
    pub icon_name: Option<String>,
}

/// Fetches group `group`'s rows, or `None` if the call failed.
pub(crate) type GroupFetcher =
    Arc<dyn Fn(u32) -> BoxFuture<'static, Option<Vec<MenuModelRow>>> + Send + Sync>;

/// Walks the graph starting at group 0.
pub(crate) async fn resolve(fetch: GroupFetcher) -> Vec<ResolvedItem> {
    let mut visited = HashSet::new();
    let mut out = Vec::new();
    walk(0, None, 0, &fetch, &mut visited, &mut out).await;
    out
}

fn walk<'a>(
    group: u32,
    parent_path: Option<Arc<StringList>>,
    depth: u32,
    fetch: &'a GroupFetcher,
    visited: &'a mut HashSet<u32>,
    out: &'a mut Vec<ResolvedItem>,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        if depth > MAX_DEPTH || !visited.insert(group) {
            return;
        }

        let Some(rows) = fetch(group).await else {
            return;
        };

        for (row_group, _id, _position, properties) in rows {
            if row_group != group {
                continue;
            }

            let label = properties
                .get("label")
                .and_then(|v| String::try_from(v.clone()).ok());
            let action = properties
                .get("action")
                .and_then(|v| String::try_from(v.clone()).ok());
            let target = properties.get("target").cloned();
            let enabled = properties
                .get("enabled")
                .and_then(|v| bool::try_from(v.clone()).ok())
                .unwrap_or(true);
            let section = properties
                .get(":section")
                .and_then(|v| <(u32, u32)>::try_from(v.clone()).ok());
            let submenu = properties
                .get(":submenu")
                .and_then(|v| <(u32, u32)>::try_from(v.clone()).ok());
            // `icon` carries a serialized GIcon; only the themed-icon-name
            // encoding (a plain string) is recognised, matching what this
            // exporter's well-known clients actually send.
            let icon_name = properties
                .get("icon")
                .and_then(|v| String::try_from(v.clone()).ok())
                .filter(|name| !name.is_empty());

            // A section splices its target group's rows into the current
            // path with no label of its own.
            if let Some((_, target_group)) = section {
                walk(target_group, parent_path.clone(), depth, fetch, visited, out).await;
                continue;
            }

            let this_path = match (&label, &parent_path) {
                (Some(label), Some(parent)) => {
                    Some(Arc::new(StringList::cons(label.clone(), parent)))
                }
                (Some(label), None) => Some(Arc::new(StringList::singleton(label.clone()))),
                (None, _) => parent_path.clone(),
            };

            if let Some((_, target_group)) = submenu {
                walk(target_group, this_path, depth + 1, fetch, visited, out).await;
                continue;
            }

            if let (Some(path), Some(action)) = (this_path, action) {
                out.push(ResolvedItem {
                    path,
                    action,
                    target,
                    enabled,
                    icon_name,
                });
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use zbus::zvariant::Value;

    use super::*;

    fn row(
        group: u32,
        id: u32,
        label: Option<&str>,
        action: Option<&str>,
        section: Option<(u32, u32)>,
        submenu: Option<(u32, u32)>,
    ) -> MenuModelRow {
        let mut properties = HashMap::new();
        if let Some(label) = label {
            properties.insert(
                "label".to_string(),
                OwnedValue::try_from(Value::from(label)).unwrap(),
            );
        }
        if let Some(action) = action {
            properties.insert(
                "action".to_string(),
                OwnedValue::try_from(Value::from(action)).unwrap(),
            );
        }
        if let Some(link) = section {
            properties.insert(
                ":section".to_string(),
                OwnedValue::try_from(Value::from(link)).unwrap(),
            );
        }
        if let Some(link) = submenu {
            properties.insert(
                ":submenu".to_string(),
                OwnedValue::try_from(Value::from(link)).unwrap(),
            );
        }
        (group, id, 0, properties)
    }

    #[tokio::test]
    async fn a_section_contributes_no_path_segment() {
        let fetch: GroupFetcher = Arc::new(|group| {
            Box::pin(async move {
                match group {
                    0 => Some(vec![row(0, 0, None, None, Some((0, 1)), None)]),
                    1 => Some(vec![row(1, 0, Some("Quit"), Some("app.quit"), None, None)]),
                    _ => None,
                }
            })
        });

        let items = resolve(fetch).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path.to_string(), "Quit");
        assert_eq!(items[0].action, "app.quit");
    }

    #[tokio::test]
    async fn a_submenu_prefixes_its_children_with_its_own_label() {
        let fetch: GroupFetcher = Arc::new(|group| {
            Box::pin(async move {
                match group {
                    0 => Some(vec![row(0, 0, Some("File"), None, None, Some((0, 1)))]),
                    1 => Some(vec![row(1, 0, Some("New"), Some("app.new"), None, None)]),
                    _ => None,
                }
            })
        });

        let items = resolve(fetch).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path.to_string(), "File > New");
    }

    #[tokio::test]
    async fn a_group_cycle_is_not_followed_twice() {
        let fetch: GroupFetcher = Arc::new(|group| {
            Box::pin(async move {
                match group {
                    0 => Some(vec![row(0, 0, Some("Loop"), None, None, Some((0, 1)))]),
                    1 => Some(vec![row(1, 0, Some("Back"), None, None, Some((1, 0)))]),
                    _ => None,
                }
            })
        });

        // Must terminate; a cyclic graph must not cause infinite recursion.
        let items = resolve(fetch).await;
        assert!(items.is_empty());
    }
}
