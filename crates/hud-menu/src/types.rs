//! Wire-level aliases for the `com.canonical.dbusmenu` layout structures.
//!
//! `GetLayout` returns a recursive structure; zbus maps it onto nested
//! tuples rather than a named struct because the children are themselves
//! layout nodes wrapped in `Variant`.

use std::collections::HashMap;

use zbus::zvariant::OwnedValue;

pub(crate) type RawMenuItemProps = HashMap<String, OwnedValue>;
pub(crate) type RawMenuLayoutNode = (i32, RawMenuItemProps, Vec<OwnedValue>);
pub(crate) type RawMenuLayout = (u32, RawMenuLayoutNode);
pub(crate) type RawMenuItemsPropsList = Vec<(i32, RawMenuItemProps)>;
pub(crate) type RawMenuItemKeysList = Vec<(i32, Vec<String>)>;

/// One node of the locally-mirrored dbusmenu tree.
#[derive(Debug, Clone)]
pub(crate) struct MenuNode {
    pub id: i32,
    pub item_type: Option<String>,
    pub label: Option<String>,
    pub enabled: bool,
    pub visible: bool,
    pub icon_name: Option<String>,
    pub properties: RawMenuItemProps,
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    pub fn from_raw(node: RawMenuLayoutNode) -> Self {
        let (id, properties, raw_children) = node;

        let item_type = properties
            .get("type")
            .and_then(|v| String::try_from(v.clone()).ok());
        let label = properties
            .get("label")
            .and_then(|v| String::try_from(v.clone()).ok());
        let enabled = properties
            .get("enabled")
            .and_then(|v| bool::try_from(v.clone()).ok())
            .unwrap_or(true);
        let visible = properties
            .get("visible")
            .and_then(|v| bool::try_from(v.clone()).ok())
            .unwrap_or(true);
        let icon_name = properties
            .get("icon-name")
            .and_then(|v| String::try_from(v.clone()).ok())
            .filter(|name| !name.is_empty());

        let children = raw_children
            .into_iter()
            .filter_map(|child| RawMenuLayoutNode::try_from(child).ok())
            .map(MenuNode::from_raw)
            .collect();

        Self {
            id,
            item_type,
            label,
            enabled,
            visible,
            icon_name,
            properties,
            children,
        }
    }
}
