//! Context hint extraction.
//!
//! Direct hints come from "requires/needs ... expertise|knowledge" and
//! "requires/needs ... understanding ..." phrasing; subtle hints from
//! "consider/understand/analyze ...". Each pattern family runs over the whole
//! text on its own and contributes its matches in positional order.

use crate::types::ContextHints;
use regex::Regex;
use std::sync::LazyLock;

/// "requires security expertise" -> "security"
static EXPERTISE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:requires?|needs?)\s+([^.]+?)\s+(?:expertise|knowledge)")
        .expect("expertise pattern is valid")
});

/// "requires deep understanding of X." -> "deep understanding of X"
static UNDERSTANDING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:requires?|needs?)\s+([^.]*understanding[^.]*)")
        .expect("understanding pattern is valid")
});

/// Stops at the next period, comma, or newline.
static SUBTLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:consider|understand|analyze)\s+([^.,\n]+)")
        .expect("subtle pattern is valid")
});

/// Extract direct and subtle expertise hints from skill content.
///
/// Empty content yields empty hints. Captures are trimmed but otherwise kept
/// as-is: no deduplication, no filtering.
pub fn extract_context_hints(content: &str) -> ContextHints {
    if content.is_empty() {
        return ContextHints::default();
    }

    let mut direct = expertise_hints(content);
    direct.extend(understanding_hints(content));

    ContextHints {
        direct,
        subtle: subtle_hints(content),
    }
}

/// Phrases between a requires/needs trigger and "expertise"/"knowledge".
pub fn expertise_hints(content: &str) -> Vec<String> {
    captures(&EXPERTISE_PATTERN, content)
}

/// Requires/needs phrases that mention "understanding", up to the next period.
pub fn understanding_hints(content: &str) -> Vec<String> {
    captures(&UNDERSTANDING_PATTERN, content)
}

/// Phrases following consider/understand/analyze.
pub fn subtle_hints(content: &str) -> Vec<String> {
    captures(&SUBTLE_PATTERN, content)
}

fn captures(pattern: &Regex, content: &str) -> Vec<String> {
    pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}
