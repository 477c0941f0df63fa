//! Request complexity detection.
//!
//! Decides whether a message is involved enough to warrant expert personas.
//! Signals and weights:
//! - more than 50 words: +2 (`length`)
//! - each technical keyword present: +1 (`keywords`)
//! - fenced or inline code: +3 (`code-blocks`)
//! - more than one question mark: +2 (`multiple-questions`)
//! - a source file path: +1 (`file-paths`)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Default score at which a request counts as complex.
pub const DEFAULT_COMPLEXITY_THRESHOLD: u32 = 3;

const LONG_MESSAGE_WORDS: usize = 50;

const TECHNICAL_KEYWORDS: &[&str] = &[
    "React",
    "Vue",
    "Angular",
    "API",
    "REST",
    "GraphQL",
    "database",
    "SQL",
    "MongoDB",
    "PostgreSQL",
    "performance",
    "optimization",
    "optimize",
    "benchmark",
    "security",
    "authentication",
    "encryption",
    "deployment",
    "CI/CD",
    "Docker",
    "Kubernetes",
    "testing",
    "TDD",
    "debugging",
    "TypeScript",
    "JavaScript",
    "Python",
    "Node.js",
];

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*```").expect("fenced code pattern is valid"));

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]+`").expect("inline code pattern is valid"));

static FILE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/[\w\-./]+\.(?:js|ts|py|go|rs|java)").expect("file path pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub is_complex: bool,
    /// Signal names that contributed, in evaluation order.
    pub reasons: Vec<String>,
    /// Technical keywords found, in list order.
    pub keywords: Vec<String>,
    pub score: u32,
}

/// Score a message's complexity against `threshold` (inclusive).
pub fn detect_complexity(message: &str, threshold: u32) -> ComplexityReport {
    let mut reasons = Vec::new();
    let mut score: u32 = 0;

    if message.split_whitespace().count() > LONG_MESSAGE_WORDS {
        reasons.push("length".to_string());
        score += 2;
    }

    let lower = message.to_lowercase();
    let keywords: Vec<String> = TECHNICAL_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(&kw.to_lowercase()))
        .map(|kw| (*kw).to_string())
        .collect();
    if !keywords.is_empty() {
        reasons.push("keywords".to_string());
        score += keywords.len() as u32;
    }

    if FENCED_CODE.is_match(message) || INLINE_CODE.is_match(message) {
        reasons.push("code-blocks".to_string());
        score += 3;
    }

    if message.matches('?').count() > 1 {
        reasons.push("multiple-questions".to_string());
        score += 2;
    }

    if FILE_PATH.is_match(message) {
        reasons.push("file-paths".to_string());
        score += 1;
    }

    ComplexityReport {
        is_complex: score >= threshold,
        reasons,
        keywords,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_message_is_not_complex() {
        let report = detect_complexity("hello there", DEFAULT_COMPLEXITY_THRESHOLD);
        assert!(!report.is_complex);
        assert_eq!(report.score, 0);
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn counts_each_technical_keyword() {
        let report = detect_complexity(
            "Tune the PostgreSQL database for performance",
            DEFAULT_COMPLEXITY_THRESHOLD,
        );
        // "SQL" also matches inside "PostgreSQL"
        assert_eq!(
            report.keywords,
            vec!["database", "SQL", "PostgreSQL", "performance"]
        );
        assert_eq!(report.score, 4);
        assert!(report.is_complex);
        assert_eq!(report.reasons, vec!["keywords"]);
    }

    #[test]
    fn detects_code_questions_and_paths() {
        let report = detect_complexity(
            "Why does `run()` fail? And why in /src/main.rs?",
            DEFAULT_COMPLEXITY_THRESHOLD,
        );
        assert_eq!(
            report.reasons,
            vec!["code-blocks", "multiple-questions", "file-paths"]
        );
        assert_eq!(report.score, 6);
    }

    #[test]
    fn detects_fenced_code_over_lines() {
        let report = detect_complexity("look:\n```\nfn main() {}\n```", 10);
        assert!(report.reasons.contains(&"code-blocks".to_string()));
        assert!(!report.is_complex);
    }

    #[test]
    fn long_messages_score_two() {
        let message = "word ".repeat(51);
        let report = detect_complexity(&message, 2);
        assert_eq!(report.reasons, vec!["length"]);
        assert!(report.is_complex);
    }
}
