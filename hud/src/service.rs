//! The bus surface (§6): one well-known name, one interface, two methods.

use std::sync::Arc;

use hud_query::{ExecuteError, Query};
use hud_source::{Source, SourceList};
use hud_usage::UsageTracker;
use tokio::sync::Mutex;
use tracing::instrument;
use zbus::zvariant::{OwnedValue, Value};
use zbus::{fdo, interface};

pub const BUS_NAME: &str = "com.canonical.hud";
pub const OBJECT_PATH: &str = "/com/canonical/hud";
const DEFAULT_NUM_RESULTS: usize = 20;

/// One `(display_html, app_icon_name, item_icon_name, reserved, opaque_key)`
/// suggestion row.
type Suggestion = (String, String, String, String, OwnedValue);

/// Holds the single standing [`Query`] a `GetSuggestions` call replaces on
/// every keystroke, and dispatches `ExecuteQuery` against it.
pub struct HudService {
    source: Arc<SourceList>,
    usage: Arc<UsageTracker>,
    current: Mutex<Option<Arc<Query>>>,
}

impl HudService {
    pub fn new(source: Arc<SourceList>, usage: Arc<UsageTracker>) -> Self {
        Self {
            source,
            usage,
            current: Mutex::new(None),
        }
    }
}

#[interface(name = "com.canonical.hud")]
impl HudService {
    /// Replaces the standing query with a fresh one over `query`, closing
    /// whatever query preceded it.
    #[instrument(skip(self))]
    async fn get_suggestions(&self, query: String) -> fdo::Result<(String, Vec<Suggestion>)> {
        let source = self.source.clone() as Arc<dyn Source>;
        let new_query = Query::new(source, self.usage.clone(), query, DEFAULT_NUM_RESULTS).await;

        let suggestions = new_query
            .results()
            .iter()
            .enumerate()
            .map(|(index, result)| {
                let key = Value::from((String::from("index"), index as i32));
                #[allow(clippy::expect_used)]
                let owned_key =
                    OwnedValue::try_from(key).expect("(String, i32) always converts to OwnedValue");
                (
                    result.render_html(),
                    result.item().app_icon_name().unwrap_or_default().to_string(),
                    result.item().item_icon_name().unwrap_or_default().to_string(),
                    String::new(),
                    owned_key,
                )
            })
            .collect();

        let mut current = self.current.lock().await;
        if let Some(previous) = current.replace(new_query) {
            previous.close().await;
        }

        Ok((String::new(), suggestions))
    }

    /// Dispatches the activation at `key` against the standing query, marks
    /// usage, then closes it. `key` is the `(s, i)` tag/index pair handed
    /// out by the preceding `GetSuggestions` call.
    #[instrument(skip(self, key))]
    async fn execute_query(&self, key: OwnedValue, timestamp: u32) -> fdo::Result<()> {
        let index = decode_key(&key).ok_or_else(unknown_key)?;

        let query = self.current.lock().await.take().ok_or_else(unknown_key)?;
        query.execute(index, timestamp).await.map_err(|err| match err {
            ExecuteError::UnknownKey => unknown_key(),
            ExecuteError::Closed => unknown_key(),
        })
    }
}

fn decode_key(key: &OwnedValue) -> Option<usize> {
    let (tag, index): (String, i32) = key.clone().try_into().ok()?;
    if tag != "index" || index < 0 {
        return None;
    }
    Some(index as usize)
}

fn unknown_key() -> fdo::Error {
    fdo::Error::Failed("com.canonical.Hud.Error.UnknownKey".to_string())
}
