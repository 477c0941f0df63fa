//! Skill-driven agent orchestration.
//!
//! Extracts context hints and conditional rules from a skill document, scores
//! the agent catalog against them and the user's message, and reports which
//! agents to activate. Every function here is a pure computation over its
//! arguments, so callers may run analyses concurrently without coordination.

mod conditionals;
mod hints;
mod scorer;

pub use conditionals::{bullet_rules, extract_conditional_blocks, inline_rules};
pub use hints::{expertise_hints, extract_context_hints, subtle_hints, understanding_hints};
pub use scorer::{matches_keywords, score_and_select_agents, ScoringPolicy, Selection};

use crate::types::{Agent, OrchestrationResult};

/// Analyze skill content against a user message and pick agents to activate.
///
/// `None` skill content is treated like an empty document: only conditional
/// rules could score, and there are none, so everything stays at zero.
pub fn analyze_skill_and_activate_agents(
    skill_content: Option<&str>,
    user_message: &str,
    agents: &[Agent],
    policy: &ScoringPolicy,
) -> OrchestrationResult {
    let content = skill_content.unwrap_or_default();

    let hints = extract_context_hints(content);
    let conditionals = extract_conditional_blocks(content);
    let Selection {
        activated_agents,
        scores,
    } = score_and_select_agents(&hints, &conditionals, user_message, agents, policy);

    OrchestrationResult {
        activated_agents,
        hints,
        conditionals,
        scores,
    }
}
