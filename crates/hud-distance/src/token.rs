//! Tokeniser: converts label strings and paths into [`TokenList`]s.

use unicode_normalization::UnicodeNormalization;

use crate::string_list::StringList;

/// Separator characters a label is split on.
const SEPARATORS: [char; 4] = [' ', '.', '-', '>'];

/// One greater than the maximum token length; tokens are truncated to
/// `TOKEN_LENGTH_LIMIT - 1` code points during normalisation.
const TOKEN_LENGTH_LIMIT: usize = 32;

/// A normalised, case-folded, separator-split substring of a label.
///
/// Stores both the normalised code-point sequence used for distance
/// computation and the original text, used for highlight rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    normalized: Vec<char>,
    original: String,
}

impl Token {
    /// Builds a token from raw text, NFKC-normalising, case-folding and
    /// truncating to `TOKEN_LENGTH_LIMIT - 1` code points.
    pub fn new(original: &str) -> Self {
        let folded: Vec<char> = original
            .nfkc()
            .flat_map(char::to_lowercase)
            .collect();

        let normalized = if folded.len() >= TOKEN_LENGTH_LIMIT {
            folded[..TOKEN_LENGTH_LIMIT - 1].to_vec()
        } else {
            folded
        };

        Self {
            normalized,
            original: original.to_string(),
        }
    }

    /// The normalised code-point sequence consumed by the distance engine.
    pub fn normalized(&self) -> &[char] {
        &self.normalized
    }

    /// The original, un-normalised text, for highlight rendering.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub(crate) fn len(&self) -> usize {
        self.normalized.len()
    }
}

/// An ordered, finite sequence of [`Token`]s derived from a label or a
/// [`StringList`] path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    /// An empty token list.
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Wraps a pre-built sequence of tokens.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Borrows the underlying tokens.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Splits `input` on any byte in `" .->"`, drops empty segments, and
/// normalises each surviving segment into a [`Token`].
pub fn tokenise(input: &str) -> TokenList {
    let tokens = input
        .split(|c: char| SEPARATORS.contains(&c))
        .filter(|segment| !segment.is_empty())
        .map(Token::new)
        .collect();

    TokenList::from_tokens(tokens)
}

/// Tokenises each segment of `path` root-to-leaf and concatenates the
/// results into a single [`TokenList`].
pub fn tokenise_path(path: &StringList) -> TokenList {
    let tokens = path
        .segments()
        .into_iter()
        .flat_map(|segment| tokenise(segment).tokens)
        .collect();

    TokenList::from_tokens(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenise_splits_on_separators_and_drops_empties() {
        let list = tokenise("File.Open->Recent");
        let words: Vec<&str> = list.tokens().iter().map(Token::original).collect();
        assert_eq!(words, vec!["File", "Open", "Recent"]);
    }

    #[test]
    fn tokenise_case_folds() {
        let list = tokenise("PREFERENCES");
        assert_eq!(list.tokens()[0].normalized(), &['p', 'r', 'e', 'f', 'e', 'r', 'e', 'n', 'c', 'e', 's']);
    }

    #[test]
    fn long_token_is_truncated_to_31_code_points() {
        let long = "a".repeat(40);
        let list = tokenise(&long);
        assert_eq!(list.tokens()[0].len(), 31);
    }

    #[test]
    fn tokenise_path_concatenates_root_to_leaf() {
        use std::sync::Arc;
        let root = Arc::new(StringList::singleton("File"));
        let leaf = StringList::cons("Print Preview", &root);
        let list = tokenise_path(&leaf);
        let words: Vec<&str> = list.tokens().iter().map(Token::original).collect();
        assert_eq!(words, vec!["File", "Print", "Preview"]);
    }
}
