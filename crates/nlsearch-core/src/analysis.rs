//! Text analysis shared by the index and the classifiers.
//!
//! Indexed text is lower-cased and split on every character that is not
//! alphanumeric, so `"A repository, quite a thing"` yields
//! `["a", "repository", "quite", "a", "thing"]`. Query clause terms are *not*
//! run through this analyzer; they must match an indexed token exactly.

use std::collections::HashMap;

/// Split `text` into lower-cased alphanumeric tokens.
#[must_use]
pub fn analyze(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Term frequencies of the analyzed tokens of `text`.
#[must_use]
pub fn term_frequencies(text: &str) -> HashMap<String, u32> {
    let mut freqs = HashMap::new();
    for token in analyze(text) {
        *freqs.entry(token).or_insert(0) += 1;
    }
    freqs
}
