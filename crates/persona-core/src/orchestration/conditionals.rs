//! Conditional rule extraction.
//!
//! Two pattern families, both always evaluated over the full text:
//! - bullet rules: `- <condition> → agent-a + agent-b`
//! - inline rules: `If working with: <condition> → agent` (also `When ...`)
//!
//! Bullet matches come first, then inline matches, each in appearance order.

use crate::types::ConditionalRule;
use regex::Regex;
use std::sync::LazyLock;

static BULLET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)-\s*([^→\n]+)→\s*([a-z0-9-]+(?:\s*\+\s*[a-z0-9-]+)*)")
        .expect("bullet pattern is valid")
});

static INLINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:if|when)\s+working\s+with[:\s]+([^→]+)→\s+([a-z0-9-]+(?:\s*\+\s*[a-z0-9-]+)*)",
    )
    .expect("inline pattern is valid")
});

/// Extract every `condition → agents` rule from skill content.
///
/// No deduplication: a condition picked up by both families yields two rules.
pub fn extract_conditional_blocks(content: &str) -> Vec<ConditionalRule> {
    if content.is_empty() {
        return Vec::new();
    }

    let mut rules = bullet_rules(content);
    rules.extend(inline_rules(content));
    rules
}

/// Rules written as markdown bullets.
pub fn bullet_rules(content: &str) -> Vec<ConditionalRule> {
    BULLET_PATTERN
        .captures_iter(content)
        .filter_map(|caps| Some(make_rule(caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect()
}

/// Rules written inline after an "if/when working with" trigger.
///
/// The inline pattern can run across a line break into a bullet list; such
/// captures belong to the bullet family and are dropped here.
pub fn inline_rules(content: &str) -> Vec<ConditionalRule> {
    INLINE_PATTERN
        .captures_iter(content)
        .filter_map(|caps| {
            let raw = caps.get(1)?.as_str();
            if raw.contains('\n') {
                return None;
            }
            let condition = raw.trim();
            if condition.starts_with('-') {
                return None;
            }
            Some(make_rule(condition, caps.get(2)?.as_str()))
        })
        .collect()
}

fn make_rule(condition: &str, agents: &str) -> ConditionalRule {
    ConditionalRule {
        condition: condition.trim().to_string(),
        agents: split_agents(agents),
    }
}

fn split_agents(agents: &str) -> Vec<String> {
    agents
        .split('+')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}
