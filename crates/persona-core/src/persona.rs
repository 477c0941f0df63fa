//! Persona formatting for prompt injection.

use crate::agents::AgentProfile;
use serde::{Deserialize, Serialize};

/// How much of each persona to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaDetail {
    #[default]
    Full,
    /// Name plus the first three expertise areas.
    Minimal,
}

const MINIMAL_EXPERTISE_ITEMS: usize = 3;

/// Render activated agents as a markdown persona block.
///
/// Returns an empty string when there is nobody to render.
pub fn format_personas(agents: &[&AgentProfile], detail: PersonaDetail) -> String {
    if agents.is_empty() {
        return String::new();
    }

    let mut lines: Vec<String> = vec![
        "# Active Expert Personas".to_string(),
        String::new(),
        "The following specialized experts are available to assist with this request:"
            .to_string(),
        String::new(),
    ];

    for agent in agents {
        lines.push(format!("## {}", title_case(&agent.name)));

        match detail {
            PersonaDetail::Full => {
                lines.push(format!("**Expertise:** {}", agent.expertise.join(", ")));
                if !agent.principles.is_empty() {
                    lines.push("**Working Principles:**".to_string());
                    lines.extend(agent.principles.iter().map(|p| format!("- {p}")));
                }
                if let Some(focus) = &agent.focus {
                    lines.push(format!("**Focus areas for this request:** {focus}"));
                }
            }
            PersonaDetail::Minimal => {
                let expertise: Vec<&str> = agent
                    .expertise
                    .iter()
                    .take(MINIMAL_EXPERTISE_ITEMS)
                    .map(String::as_str)
                    .collect();
                lines.push(format!("Expertise: {}", expertise.join(", ")));
            }
        }

        lines.push(String::new());
    }

    lines.push("---".to_string());
    lines.push(String::new());
    lines.join("\n")
}

/// `frontend-architect` -> `Frontend Architect`
pub fn title_case(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
