//! Weighted Damerau-Levenshtein distance between tokens, and the
//! token-assignment distance between a query [`TokenList`] and a menu-path
//! [`TokenList`].

use crate::settings::Penalties;
use crate::token::{Token, TokenList};

/// Sentinel meaning "refused to compute": query longer than path, or
/// either list longer than 32 tokens.
pub const SENTINEL: u32 = u32::MAX;

/// Characters that are free to match against anything: ignored structural
/// punctuation rather than a real letter difference.
fn is_free_punctuation(c: char) -> bool {
    matches!(c, ' ' | '_' | '-' | '>')
}

fn char_substitution_cost(haystack: char, needle: char, penalties: &Penalties) -> u32 {
    if haystack == needle {
        return 0;
    }
    if is_free_punctuation(haystack) || is_free_punctuation(needle) {
        return 0;
    }
    let case_insensitive_equal = haystack
        .to_lowercase()
        .eq(needle.to_lowercase());
    if case_insensitive_equal {
        penalties.swap_penalty_case
    } else {
        penalties.swap_penalty
    }
}

/// Single-token weighted edit distance.
///
/// Rows are indexed by the needle (the user's typed token), columns by the
/// haystack (the menu label's token). The final pass considers every
/// prefix of the haystack and discounts the tail drop, so typing a prefix
/// of a long label is cheap.
pub fn single_token_distance(haystack: &Token, needle: &Token, penalties: &Penalties) -> u32 {
    let h = haystack.normalized();
    let n = needle.normalized();

    debug_assert!(h.len() < 32 && n.len() < 32);

    let mut d = [[0u32; 32]; 32];

    for (i, row) in d.iter_mut().enumerate().take(n.len() + 1) {
        row[0] = i as u32 * penalties.add_penalty;
    }
    for j in 0..=h.len() {
        d[0][j] = j as u32 * penalties.drop_penalty;
    }

    for i in 1..=n.len() {
        for j in 1..=h.len() {
            let needle_char = n[i - 1];
            let haystack_char = h[j - 1];

            let mut cost = if needle_char == haystack_char {
                d[i - 1][j - 1]
            } else {
                let substitution = d[i - 1][j - 1] + char_substitution_cost(haystack_char, needle_char, penalties);
                let drop = d[i][j - 1] + penalties.drop_penalty;
                let add = d[i - 1][j] + penalties.add_penalty;
                substitution.min(drop).min(add)
            };

            if i >= 2
                && j >= 2
                && n[i - 1] == h[j - 2]
                && n[i - 2] == h[j - 1]
            {
                cost = cost.min(d[i - 2][j - 2] + penalties.transpose_penalty);
            }

            d[i][j] = cost;
        }
    }

    let mut result = d[n.len()][0];
    for j in 1..=h.len() {
        result = d[n.len()][j].min(result + penalties.end_drop_penalty);
    }

    result
}

/// Scores `query` against `path`, optionally reconstructing the matched
/// path tokens in query-index order.
///
/// Returns [`SENTINEL`] if `query` has more tokens than `path`, or if
/// either list is longer than 32 tokens.
pub fn distance(
    path: &TokenList,
    query: &TokenList,
    penalties: &Penalties,
    mut matches: Option<&mut Vec<Token>>,
) -> u32 {
    let haystack = path.tokens();
    let needle = query.tokens();

    if needle.len() > haystack.len() {
        return SENTINEL;
    }
    if haystack.len() > 32 || needle.len() > 32 {
        return SENTINEL;
    }
    if haystack.is_empty() || needle.is_empty() {
        return SENTINEL;
    }

    let mut d = vec![vec![0u32; haystack.len()]; needle.len()];

    // Unroll the first needle row: free to skip any prefix of the path.
    let mut cost = single_token_distance(&haystack[0], &needle[0], penalties);
    d[0][0] = cost;
    for (j, haystack_token) in haystack.iter().enumerate().skip(1) {
        let take_cost = single_token_distance(haystack_token, &needle[0], penalties);
        cost = take_cost.min(cost + 1);
        d[0][j] = cost;
    }

    for i in 1..needle.len() {
        let mut cost = d[i - 1][i - 1] + single_token_distance(&haystack[i], &needle[i], penalties);
        d[i][i] = cost;

        for j in (i + 1)..haystack.len() {
            let prev_cost = d[i - 1][j - 1];

            if prev_cost <= penalties.max_distance && prev_cost <= cost {
                let take_cost = prev_cost + single_token_distance(&haystack[j], &needle[i], penalties);
                cost = take_cost.min(cost + 1);
            } else {
                cost += 1;
            }

            d[i][j] = cost;
        }
    }

    if let Some(out) = matches.as_deref_mut() {
        out.clear();
        out.resize(needle.len(), haystack[0].clone());

        let mut j = haystack.len() - 1;
        for i in (0..needle.len()).rev() {
            while j > i && d[i][j - 1] == d[i][j] - 1 {
                j -= 1;
            }
            out[i] = haystack[j].clone();
            if j > 0 {
                j -= 1;
            }
        }
    }

    d[needle.len() - 1][haystack.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenise;

    #[test]
    fn identical_token_lists_have_zero_distance() {
        let penalties = Penalties::default();
        let t = tokenise("File Print");
        assert_eq!(distance(&t, &t, &penalties, None), 0);
    }

    #[test]
    fn single_tokens_degenerate_to_single_token_distance() {
        let penalties = Penalties::default();
        let a = tokenise("preferences");
        let b = tokenise("pref");
        assert_eq!(
            distance(&a, &b, &penalties, None),
            single_token_distance(&a.tokens()[0], &b.tokens()[0], &penalties)
        );
    }

    #[test]
    fn query_longer_than_path_is_sentinel() {
        let penalties = Penalties::default();
        let path = tokenise("Print");
        let query = tokenise("print preview");
        assert_eq!(distance(&path, &query, &penalties, None), SENTINEL);
    }

    #[test]
    fn lists_longer_than_32_tokens_are_sentinel() {
        let penalties = Penalties::default();
        let long_path = tokenise(&"a ".repeat(40));
        let query = tokenise("a");
        assert_eq!(distance(&long_path, &query, &penalties, None), SENTINEL);
    }

    #[test]
    fn typing_a_prefix_of_a_long_label_is_cheap() {
        let penalties = Penalties::default();
        let path = tokenise("préférences");
        let short = single_token_distance(&path.tokens()[0], &tokenise("pref").tokens()[0], &penalties);
        let full = single_token_distance(&path.tokens()[0], &tokenise("préférences").tokens()[0], &penalties);
        assert!(short <= full + penalties.end_drop_penalty * 4);
        assert!(short < penalties.max_distance);
    }

    #[test]
    fn extending_a_correct_prefix_query_does_not_increase_distance() {
        let penalties = Penalties::default();
        let path = tokenise("File Print…");
        let pr = distance(&path, &tokenise("pr"), &penalties, None);
        let pri = distance(&path, &tokenise("pri"), &penalties, None);
        assert!(pri <= pr);
    }

    #[test]
    fn one_dropped_letter_still_matches() {
        let penalties = Penalties::default();
        let path = tokenise("préférences");
        let d = distance(&path, &tokenise("prf"), &penalties, None);
        assert!(d <= penalties.max_distance);
    }
}
