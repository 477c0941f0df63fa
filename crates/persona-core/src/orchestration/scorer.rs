//! Agent scoring and selection.
//!
//! Points per signal:
//! - direct hint containing an agent keyword: 10
//! - subtle hint containing an agent keyword: 5
//! - conditional rule whose condition appears in the user message: 20 to each
//!   listed agent
//!
//! An agent activates when its score is strictly greater than the threshold
//! (8 by default).

use crate::types::{Agent, ConditionalRule, ContextHints, ScoreMap};
use serde::{Deserialize, Serialize};

/// Point values and activation threshold used by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub direct_hint_points: u32,
    pub subtle_hint_points: u32,
    pub conditional_points: u32,
    /// Exclusive lower bound: scores must exceed this to activate.
    pub activation_threshold: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            direct_hint_points: 10,
            subtle_hint_points: 5,
            conditional_points: 20,
            activation_threshold: 8,
        }
    }
}

impl ScoringPolicy {
    pub fn activates(&self, score: u32) -> bool {
        score > self.activation_threshold
    }
}

/// Scores plus the agents that passed the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub activated_agents: Vec<String>,
    pub scores: ScoreMap,
}

/// Condition words this short never count as a match.
const MIN_CONDITION_WORD_CHARS: usize = 3;

/// True if any keyword occurs in `text`, ignoring case.
///
/// Substring containment, so "auth" matches "Authentication". An empty
/// keyword list never matches.
pub fn matches_keywords<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let text = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| text.contains(&keyword.as_ref().to_lowercase()))
}

/// True if any significant word of the rule's condition appears in the
/// (already lower-cased) user message.
fn condition_fires(condition: &str, message_lower: &str) -> bool {
    condition
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_CONDITION_WORD_CHARS)
        .any(|word| message_lower.contains(word))
}

/// Score every agent against the hints, conditional rules and user message,
/// then select the ones above the activation threshold.
///
/// `activated_agents` keeps the order of `agents`; it is not sorted by score.
/// Rules naming agents outside `agents` are ignored.
pub fn score_and_select_agents(
    hints: &ContextHints,
    conditionals: &[ConditionalRule],
    user_message: &str,
    agents: &[Agent],
    policy: &ScoringPolicy,
) -> Selection {
    let mut scores = ScoreMap::for_agents(agents);

    for hint in &hints.direct {
        for agent in agents {
            if matches_keywords(hint, &agent.keywords) {
                scores.add(&agent.name, policy.direct_hint_points);
            }
        }
    }

    for hint in &hints.subtle {
        for agent in agents {
            if matches_keywords(hint, &agent.keywords) {
                scores.add(&agent.name, policy.subtle_hint_points);
            }
        }
    }

    let message_lower = user_message.to_lowercase();
    for rule in conditionals {
        if condition_fires(&rule.condition, &message_lower) {
            for name in &rule.agents {
                scores.add(name, policy.conditional_points);
            }
        }
    }

    let activated_agents = agents
        .iter()
        .filter(|agent| {
            scores
                .get(&agent.name)
                .is_some_and(|score| policy.activates(score))
        })
        .map(|agent| agent.name.clone())
        .collect();

    Selection {
        activated_agents,
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents() -> Vec<Agent> {
        vec![
            Agent::new("security-expert", ["security", "auth", "encryption"]),
            Agent::new("database-expert", ["database", "sql", "query"]),
            Agent::new("frontend-expert", ["frontend", "ui", "react"]),
        ]
    }

    fn hints(direct: &[&str], subtle: &[&str]) -> ContextHints {
        ContextHints {
            direct: direct.iter().map(|s| (*s).to_string()).collect(),
            subtle: subtle.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn rule(condition: &str, agents: &[&str]) -> ConditionalRule {
        ConditionalRule {
            condition: condition.to_string(),
            agents: agents.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn score(hints: &ContextHints, rules: &[ConditionalRule], message: &str) -> Selection {
        score_and_select_agents(hints, rules, message, &agents(), &ScoringPolicy::default())
    }

    #[test]
    fn matches_keywords_ignores_case() {
        assert!(matches_keywords(
            "This involves Security and Authentication work",
            &["security", "auth"]
        ));
    }

    #[test]
    fn matches_keywords_uses_substrings() {
        assert!(matches_keywords("Authentication system", &["auth"]));
        assert!(matches_keywords("auth", &["AUTH"]));
    }

    #[test]
    fn matches_keywords_rejects_misses_and_empty_lists() {
        assert!(!matches_keywords(
            "This is about frontend development",
            &["database", "backend"]
        ));
        assert!(!matches_keywords::<&str>("Some text here", &[]));
    }

    #[test]
    fn direct_hints_score_ten_each() {
        let result = score(
            &hints(&["security expertise", "authentication flows"], &[]),
            &[],
            "Please help with the task",
        );
        assert_eq!(result.scores.get("security-expert"), Some(20));
        assert!(result.activated_agents.contains(&"security-expert".to_string()));
    }

    #[test]
    fn subtle_hints_score_five_each() {
        let result = score(
            &hints(&[], &["database performance", "query optimization"]),
            &[],
            "Please help with the task",
        );
        assert_eq!(result.scores.get("database-expert"), Some(10));
        assert!(result.activated_agents.contains(&"database-expert".to_string()));
    }

    #[test]
    fn conditional_scores_twenty() {
        let result = score(
            &hints(&[], &[]),
            &[rule("Working with React components", &["frontend-expert"])],
            "I need help with React components",
        );
        assert_eq!(result.scores.get("frontend-expert"), Some(20));
        assert_eq!(result.activated_agents, vec!["frontend-expert"]);
    }

    #[test]
    fn combines_all_sources() {
        let result = score(
            &hints(&["security expertise"], &["authentication patterns"]),
            &[rule("security implementation", &["security-expert"])],
            "I need to implement security features",
        );
        assert_eq!(result.scores.get("security-expert"), Some(35));
        assert!(result.activated_agents.contains(&"security-expert".to_string()));
    }

    #[test]
    fn single_subtle_hint_does_not_activate() {
        let result = score(&hints(&[], &["database"]), &[], "Please help");
        assert_eq!(result.scores.get("database-expert"), Some(5));
        assert!(!result.activated_agents.contains(&"database-expert".to_string()));
    }

    #[test]
    fn score_equal_to_threshold_does_not_activate() {
        let policy = ScoringPolicy {
            activation_threshold: 10,
            ..ScoringPolicy::default()
        };
        let result = score_and_select_agents(
            &hints(&["sql tuning"], &[]),
            &[],
            "",
            &agents(),
            &policy,
        );
        assert_eq!(result.scores.get("database-expert"), Some(10));
        assert!(result.activated_agents.is_empty());
    }

    #[test]
    fn no_signals_means_no_activation() {
        let result = score(&hints(&[], &[]), &[], "Some unrelated message");
        assert!(result.activated_agents.is_empty());
        assert!(result.scores.iter().all(|(_, s)| s == 0));
        assert_eq!(result.scores.len(), 3);
    }

    #[test]
    fn short_condition_words_never_fire() {
        let result = score(
            &hints(&[], &[]),
            &[rule("UI in a DB", &["frontend-expert"])],
            "ui in a db all day",
        );
        assert_eq!(result.scores.get("frontend-expert"), Some(0));
    }

    #[test]
    fn unknown_conditional_agents_are_ignored() {
        let result = score(
            &hints(&[], &[]),
            &[rule("database schema", &["ghost-agent", "database-expert"])],
            "update the database schema",
        );
        assert_eq!(result.scores.get("ghost-agent"), None);
        assert_eq!(result.scores.get("database-expert"), Some(20));
        assert_eq!(result.activated_agents, vec!["database-expert"]);
    }

    #[test]
    fn activation_keeps_agent_order_not_score_order() {
        let result = score(
            &hints(&["react ui", "sql"], &[]),
            &[rule("frontend", &["frontend-expert"])],
            "frontend work",
        );
        assert_eq!(result.scores.get("frontend-expert"), Some(30));
        assert_eq!(result.scores.get("database-expert"), Some(10));
        assert_eq!(
            result.activated_agents,
            vec!["database-expert", "frontend-expert"]
        );
    }

    #[test]
    fn custom_points_are_applied() {
        let policy = ScoringPolicy {
            direct_hint_points: 1,
            subtle_hint_points: 2,
            conditional_points: 3,
            activation_threshold: 0,
        };
        let result = score_and_select_agents(
            &hints(&["security"], &["auth"]),
            &[rule("encryption keys", &["security-expert"])],
            "rotate encryption keys",
            &agents(),
            &policy,
        );
        assert_eq!(result.scores.get("security-expert"), Some(6));
        assert_eq!(result.activated_agents, vec!["security-expert"]);
    }
}
