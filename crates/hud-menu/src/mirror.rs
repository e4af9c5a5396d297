//! Flattens a mirrored dbusmenu tree into a flat list of matchable
//! [`Item`]s, depth-first pre-order.

use std::sync::Arc;

use hud_distance::{StringList, tokenise_path};
use hud_source::{ActivationHandle, Item};

use crate::types::MenuNode;

/// Maps a node's `type` property to the property name holding its label.
/// `None` means the type is not in the allow-list and the node (not its
/// children) is skipped.
fn label_property(item_type: Option<&str>) -> Option<&'static str> {
    match item_type {
        None | Some("standard") | Some("application-item") => Some("label"),
        Some("indicator-item") => Some("indicator-label"),
        Some("appointment-item") => Some("appointment-label"),
        Some("timezone-item") => Some("timezone-name"),
        Some("sound-player-metadata") => Some("player-name"),
        Some("user-item") => Some("user-item-name"),
        Some("separator") => None,
        Some(_other) => None,
    }
}

fn is_standard(item_type: Option<&str>) -> bool {
    matches!(item_type, None | Some("standard") | Some("application-item"))
}

/// Walks `root` depth-first pre-order, emitting one `Item` per allow-listed
/// node that has a label, and recursing into every node's children
/// regardless of whether the node itself was emitted. `app_icon_name` is
/// shared by every emitted item; each item's own icon comes from its
/// node's `icon-name` property, if present.
pub(crate) fn flatten(
    root: &MenuNode,
    application_id: &str,
    app_icon_name: Option<Arc<str>>,
    make_activation: &dyn Fn(i32) -> Arc<dyn ActivationHandle>,
) -> Vec<Arc<Item>> {
    let mut items = Vec::new();
    for child in &root.children {
        walk(child, None, application_id, app_icon_name.clone(), make_activation, &mut items);
    }
    items
}

fn walk(
    node: &MenuNode,
    parent_path: Option<Arc<StringList>>,
    application_id: &str,
    app_icon_name: Option<Arc<str>>,
    make_activation: &dyn Fn(i32) -> Arc<dyn ActivationHandle>,
    out: &mut Vec<Arc<Item>>,
) {
    let Some(label_key) = label_property(node.item_type.as_deref()) else {
        // Not in the allow-list: the node itself never matches, but
        // structurally-odd remotes might still nest real items under it.
        for child in &node.children {
            walk(child, parent_path.clone(), application_id, app_icon_name.clone(), make_activation, out);
        }
        return;
    };

    let label = node
        .properties
        .get(label_key)
        .and_then(|v| String::try_from(v.clone()).ok())
        .or_else(|| node.label.clone());

    let mut this_path = parent_path.clone();

    if let Some(label) = label {
        let included = if is_standard(node.item_type.as_deref()) {
            node.enabled && node.visible
        } else {
            node.visible
        };

        let path = Arc::new(match &parent_path {
            Some(parent) => StringList::cons(label.clone(), parent),
            None => StringList::singleton(label.clone()),
        });
        this_path = Some(Arc::clone(&path));

        if included {
            let tokens = tokenise_path(&path);
            if !tokens.is_empty() {
                let item_icon_name = node.icon_name.as_deref().map(Arc::from);
                let item = Item::new(
                    path,
                    tokens,
                    application_id,
                    node.enabled,
                    make_activation(node.id),
                    app_icon_name.clone(),
                    item_icon_name,
                );
                out.push(Arc::new(item));
            }
        }
    }

    for child in &node.children {
        walk(child, this_path.clone(), application_id, app_icon_name.clone(), make_activation, out);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use hud_source::ActivationError;
    use zbus::zvariant::{OwnedValue, Value};

    use super::*;

    #[derive(Debug)]
    struct NullActivation;

    #[async_trait]
    impl ActivationHandle for NullActivation {
        async fn activate(&self, _timestamp: u32) -> Result<(), ActivationError> {
            Ok(())
        }
    }

    fn leaf(id: i32, label: &str, icon_name: Option<&str>) -> MenuNode {
        let mut properties = HashMap::new();
        properties.insert("label".to_string(), OwnedValue::try_from(Value::from(label)).unwrap());
        if let Some(icon) = icon_name {
            properties.insert("icon-name".to_string(), OwnedValue::try_from(Value::from(icon)).unwrap());
        }
        MenuNode {
            id,
            item_type: None,
            label: Some(label.to_string()),
            enabled: true,
            visible: true,
            icon_name: icon_name.map(str::to_string),
            properties,
            children: Vec::new(),
        }
    }

    #[test]
    fn items_carry_the_shared_app_icon_and_their_own_item_icon() {
        let root = MenuNode {
            id: 0,
            item_type: None,
            label: None,
            enabled: true,
            visible: true,
            icon_name: None,
            properties: HashMap::new(),
            children: vec![leaf(1, "Print", Some("document-print")), leaf(2, "Quit", None)],
        };

        let make_activation: &dyn Fn(i32) -> Arc<dyn ActivationHandle> = &|_id| Arc::new(NullActivation);
        let items = flatten(&root, "app.desktop", Some(Arc::from("app-icon")), make_activation);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].app_icon_name(), Some("app-icon"));
        assert_eq!(items[0].item_icon_name(), Some("document-print"));
        assert_eq!(items[1].app_icon_name(), Some("app-icon"));
        assert_eq!(items[1].item_icon_name(), None);
    }
}
