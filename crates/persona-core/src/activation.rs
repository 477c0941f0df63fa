//! Agent activation for a user request.
//!
//! Chooses the agents for a request, in priority order:
//! 1. Explicitly forced agents.
//! 2. Skill-driven orchestration over the skill content and message.
//! 3. Plain keyword matching of the message against each agent.
//!
//! The result is capped at `max_agents_per_request` and rendered into a
//! persona block.

use crate::agents::AgentProfile;
use crate::config::Config;
use crate::orchestration::{analyze_skill_and_activate_agents, matches_keywords};
use crate::persona::format_personas;
use crate::types::{Agent, OrchestrationResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the activated agents were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStrategy {
    /// The caller named the agents.
    Forced,
    /// Skill hints and rules scored past the threshold.
    Orchestrated,
    /// The message matched agent keywords directly.
    KeywordFallback,
    /// Nobody was activated.
    None,
}

impl ActivationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forced => "forced",
            Self::Orchestrated => "orchestrated",
            Self::KeywordFallback => "keyword_fallback",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRequest {
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub force_agents: Vec<String>,
    /// Raw SKILL.md content guiding the request, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    pub strategy: ActivationStrategy,
    pub activated_agents: Vec<String>,
    /// Rendered persona block; empty when nobody is active.
    pub personas: String,
    /// Present whenever orchestration ran, even if it activated nobody.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestration: Option<OrchestrationResult>,
    /// Forced names with no matching agent definition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

pub fn activate(request: &ActivationRequest, profiles: &[AgentProfile], config: &Config) -> Activation {
    let mut errors = Vec::new();
    let mut orchestration = None;

    let (strategy, mut activated) = if request.force_agents.is_empty() {
        let agents: Vec<Agent> = profiles.iter().map(AgentProfile::agent).collect();
        let result = analyze_skill_and_activate_agents(
            request.skill_content.as_deref(),
            &request.user_message,
            &agents,
            &config.scoring_policy(),
        );
        let orchestrated = result.activated_agents.clone();
        orchestration = Some(result);

        if orchestrated.is_empty() {
            let matched = keyword_matches(&request.user_message, &agents);
            if matched.is_empty() {
                (ActivationStrategy::None, matched)
            } else {
                (ActivationStrategy::KeywordFallback, matched)
            }
        } else {
            (ActivationStrategy::Orchestrated, orchestrated)
        }
    } else {
        let mut forced: Vec<String> = Vec::new();
        for name in &request.force_agents {
            let name = name.trim();
            if name.is_empty() || forced.iter().any(|n| n == name) {
                continue;
            }
            if !profiles.iter().any(|p| p.name == name) {
                errors.push(format!("unknown agent: {name}"));
            }
            forced.push(name.to_string());
        }
        (ActivationStrategy::Forced, forced)
    };

    if config.max_agents_per_request > 0 {
        activated.truncate(config.max_agents_per_request);
    }

    let selected: Vec<&AgentProfile> = profiles
        .iter()
        .filter(|p| activated.contains(&p.name))
        .collect();
    let personas = format_personas(&selected, config.persona_detail);

    debug!(
        strategy = strategy.as_str(),
        activated = ?activated,
        "agent activation complete"
    );

    Activation {
        strategy,
        activated_agents: activated,
        personas,
        orchestration,
        errors,
    }
}

fn keyword_matches(message: &str, agents: &[Agent]) -> Vec<String> {
    agents
        .iter()
        .filter(|agent| matches_keywords(message, &agent.keywords))
        .map(|agent| agent.name.clone())
        .collect()
}
