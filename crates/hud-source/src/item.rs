//! The atomic searchable unit, and the handle that dispatches its
//! activation back to the owning remote menu.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use hud_distance::{StringList, TokenList};

/// Failure of an activation round-trip.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    /// The remote menu rejected or failed to service the activation call.
    #[error("activation failed: {0}")]
    Remote(String),
}

/// An opaque, backend-specific callable that invokes one menu item on its
/// owning remote menu.
///
/// Implementors carry whatever address a given protocol needs (bus name,
/// object path, numeric item id for dbusmenu; action group and target for
/// menu-model) behind this single interface so `Item` and the query
/// pipeline never branch on backend.
#[async_trait]
pub trait ActivationHandle: Send + Sync + fmt::Debug {
    /// Invokes the item. `timestamp` is the caller-supplied event time.
    async fn activate(&self, timestamp: u32) -> Result<(), ActivationError>;
}

/// A leaf menu item, indexed and matchable regardless of which collector
/// produced it.
#[derive(Debug, Clone)]
pub struct Item {
    path: Arc<StringList>,
    tokens: Arc<TokenList>,
    application_id: Arc<str>,
    /// The `(application_id, item_identifier)` composite key under which
    /// usage is tracked; defaults to the rendered path.
    identifier: Arc<str>,
    enabled: bool,
    activation: Arc<dyn ActivationHandle>,
    /// The icon of the application/indicator this item belongs to, shared
    /// by every item a given collector produces.
    app_icon_name: Option<Arc<str>>,
    /// This item's own icon, if its remote menu specified one.
    item_icon_name: Option<Arc<str>>,
}

impl Item {
    /// Builds an item from its display path, a pre-tokenised path, the
    /// owning application id and its activation handle.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        path: Arc<StringList>,
        tokens: TokenList,
        application_id: impl Into<Arc<str>>,
        enabled: bool,
        activation: Arc<dyn ActivationHandle>,
        app_icon_name: Option<Arc<str>>,
        item_icon_name: Option<Arc<str>>,
    ) -> Self {
        let identifier: Arc<str> = path.to_string().into();
        Self {
            path,
            tokens: Arc::new(tokens),
            application_id: application_id.into(),
            identifier,
            enabled,
            activation,
            app_icon_name,
            item_icon_name,
        }
    }

    /// The display path, root to leaf.
    pub fn path(&self) -> &StringList {
        &self.path
    }

    /// The tokens matched against a query.
    pub fn tokens(&self) -> &TokenList {
        &self.tokens
    }

    /// The application this item belongs to; the usage-tracker key's first component.
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// The usage-tracker key's second component.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whether the item is currently enabled on the remote menu. Disabled
    /// items are still indexed but marked as such for the UI to dim.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The icon of the owning application/indicator, if known.
    pub fn app_icon_name(&self) -> Option<&str> {
        self.app_icon_name.as_deref()
    }

    /// This item's own icon, if its remote menu specified one.
    pub fn item_icon_name(&self) -> Option<&str> {
        self.item_icon_name.as_deref()
    }

    /// Dispatches the activation event back to the owning remote menu.
    ///
    /// # Errors
    /// Returns an error if the remote call fails.
    pub async fn activate(&self, timestamp: u32) -> Result<(), ActivationError> {
        self.activation.activate(timestamp).await
    }
}

#[cfg(test)]
mod tests {
    use hud_distance::tokenise;

    use super::*;

    #[derive(Debug)]
    struct NullActivation;

    #[async_trait]
    impl ActivationHandle for NullActivation {
        async fn activate(&self, _timestamp: u32) -> Result<(), ActivationError> {
            Ok(())
        }
    }

    #[test]
    fn identifier_defaults_to_the_rendered_path() {
        let path = Arc::new(StringList::singleton("Print…"));
        let item = Item::new(
            path.clone(),
            tokenise("Print"),
            "gedit.desktop",
            true,
            Arc::new(NullActivation),
            None,
            None,
        );
        assert_eq!(item.identifier(), "Print…");
        assert_eq!(item.application_id(), "gedit.desktop");
    }

    #[tokio::test]
    async fn activate_delegates_to_the_handle() {
        let path = Arc::new(StringList::singleton("Print…"));
        let item = Item::new(
            path,
            tokenise("Print"),
            "gedit.desktop",
            true,
            Arc::new(NullActivation),
            None,
            None,
        );
        assert!(item.activate(0).await.is_ok());
    }

    #[test]
    fn icon_names_default_to_none_and_round_trip_when_set() {
        let path = Arc::new(StringList::singleton("Print…"));
        let item = Item::new(
            path.clone(),
            tokenise("Print"),
            "gedit.desktop",
            true,
            Arc::new(NullActivation),
            Some(Arc::from("printer")),
            Some(Arc::from("document-print")),
        );
        assert_eq!(item.app_icon_name(), Some("printer"));
        assert_eq!(item.item_icon_name(), Some("document-print"));

        let bare = Item::new(path, tokenise("Print"), "gedit.desktop", true, Arc::new(NullActivation), None, None);
        assert_eq!(bare.app_icon_name(), None);
        assert_eq!(bare.item_icon_name(), None);
    }
}
