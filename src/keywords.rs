//! Keyword extraction from raw text.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"[a-z0-9+.#-]{2,}").unwrap())
}

/// Extract the normalized keyword set from raw text.
///
/// Lowercases the input and keeps maximal runs of `[a-z0-9+.#-]` at
/// least two characters long, so tokens like `c++`, `c#`, and `.net`
/// survive. Total function: empty or punctuation-only input yields an
/// empty set.
pub fn tokenize(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    token_re()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}
