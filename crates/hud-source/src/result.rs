//! The pairing of a matched [`Item`] with the query that produced it.

use std::sync::Arc;

use hud_distance::Token;

use crate::item::Item;

/// A single match produced by a [`crate::Source::search`] call.
///
/// Invariant: `distance` was `<= settings.max_distance` at the moment this
/// result was produced. A settings change afterwards does not retroactively
/// invalidate an already-produced result.
#[derive(Debug, Clone)]
pub struct MatchResult {
    item: Arc<Item>,
    distance: u32,
    matched_tokens: Vec<Token>,
}

impl MatchResult {
    /// Builds a result from a scored item and its matched path tokens.
    pub fn new(item: Arc<Item>, distance: u32, matched_tokens: Vec<Token>) -> Self {
        Self {
            item,
            distance,
            matched_tokens,
        }
    }

    /// The matched item.
    pub fn item(&self) -> &Arc<Item> {
        &self.item
    }

    /// The raw match distance (before usage-based re-ranking).
    pub fn distance(&self) -> u32 {
        self.distance
    }

    /// The path tokens the query matched against, in query order, for
    /// highlight rendering.
    pub fn matched_tokens(&self) -> &[Token] {
        &self.matched_tokens
    }

    /// Renders the display path with matched tokens wrapped in `<b>…</b>`
    /// and the connector rendered as ` &gt; `.
    pub fn render_html(&self) -> String {
        let segments = self.item.path().segments();
        let matched_originals: Vec<&str> = self
            .matched_tokens
            .iter()
            .map(Token::original)
            .collect();

        segments
            .iter()
            .map(|segment| {
                if matched_originals.iter().any(|m| segment.contains(m)) {
                    highlight_segment(segment, &matched_originals)
                } else {
                    html_escape(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(" &gt; ")
    }
}

fn highlight_segment(segment: &str, matched: &[&str]) -> String {
    let mut rendered = html_escape(segment);
    for needle in matched {
        if needle.is_empty() {
            continue;
        }
        let escaped_needle = html_escape(needle);
        let wrapped = format!("<b>{escaped_needle}</b>");
        rendered = rendered.replacen(&escaped_needle, &wrapped, 1);
    }
    rendered
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use hud_distance::{StringList, tokenise};

    use super::*;
    use crate::item::{ActivationError, ActivationHandle};

    #[derive(Debug)]
    struct NullActivation;

    #[async_trait]
    impl ActivationHandle for NullActivation {
        async fn activate(&self, _timestamp: u32) -> Result<(), ActivationError> {
            Ok(())
        }
    }

    #[test]
    fn render_html_wraps_matched_tokens_and_escapes_connector() {
        let root = Arc::new(StringList::singleton("File"));
        let path = Arc::new(StringList::cons("Print…", &root));
        let item = Arc::new(Item::new(
            path,
            tokenise("File Print"),
            "app",
            true,
            Arc::new(NullActivation),
            None,
            None,
        ));

        let result = MatchResult::new(item, 5, vec![tokenise("Print").tokens()[0].clone()]);
        let html = result.render_html();

        assert!(html.contains("&gt;"));
        assert!(html.contains("<b>Print</b>"));
    }
}
