//! Function-annotation normalization.
//!
//! Collapses lexical variants of gene-function strings into one comparable
//! form before they reach the resolution engine. Every rule is a plain
//! rewrite, so the output depends only on the input text.

use std::sync::OnceLock;

use deunicode::deunicode_with_tofu;
use regex::Regex;

use crate::constants::normalize::{
    ACCESSION_PATTERNS, HYPOTHETICAL, HYPOTHETICAL_MARKERS, NOISE_PHRASES, REWRITES,
};
use crate::types::FunctionText;

/// Normalize a raw function annotation.
///
/// Returns `None` when nothing informative is left, so an absent value is
/// never confused with a present empty string.
///
/// Runs of spaces are collapsed before newlines become spaces, so text with
/// spaces around an embedded newline keeps a run of spaces and is not a fixed
/// point: `"tail \n fiber"` gives `"tail   fiber"`, which normalizes again to
/// `"tail fiber"`. Lines read from input never contain a newline.
///
/// # Example
///
/// ```
/// use dedupe_functions::normalize::normalize_function;
///
/// assert_eq!(
///     normalize_function("Putative baseplate protein gp15").as_deref(),
///     Some("baseplate")
/// );
/// assert_eq!(normalize_function("putative protein"), None);
/// ```
pub fn normalize_function(raw: &str) -> Option<FunctionText> {
    let mut text = deunicode_with_tofu(raw, "").to_lowercase();

    if HYPOTHETICAL_MARKERS
        .iter()
        .any(|marker| text.contains(marker))
    {
        text = HYPOTHETICAL.to_string();
    }

    for phrase in NOISE_PHRASES {
        text = text.replace(phrase, "");
    }
    for (from, to) in REWRITES {
        text = text.replace(from, to);
    }
    for pattern in accession_patterns() {
        text = pattern.replace_all(&text, " ").into_owned();
    }

    let text = collapse_spaces(&text).replace('\n', " ");
    let cleaned = text
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Collapse runs of two or more ASCII spaces into one.
///
/// Other whitespace is left alone; newlines are handled separately.
pub fn collapse_spaces(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut seen_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if !seen_space {
                collapsed.push(' ');
                seen_space = true;
            }
        } else {
            collapsed.push(ch);
            seen_space = false;
        }
    }
    collapsed
}

fn accession_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        ACCESSION_PATTERNS
            .iter()
            .map(|pattern| {
                Regex::new(&format!("(?i){pattern}")).expect("valid accession pattern")
            })
            .collect()
    })
}
