//! Agent persona documents.
//!
//! Each agent is a markdown file whose optional YAML frontmatter lists the
//! activation keywords and persona details:
//!
//! ```text
//! ---
//! name: security-engineer
//! expertise: [Authentication, Cryptography]
//! activation_keywords: [security, auth, crypto]
//! complexity_threshold: high
//! ---
//! ```

use crate::frontmatter;
use crate::skills::validate_name;
use crate::types::Agent;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Request complexity an agent is meant for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ComplexityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Full agent definition as loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    /// Activation keywords (`activation_keywords` in frontmatter).
    pub keywords: Vec<String>,
    pub expertise: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub principles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    pub complexity_threshold: ComplexityLevel,
    /// Path to the agent markdown file.
    pub path: PathBuf,
}

impl AgentProfile {
    /// The name/keywords view used for scoring.
    pub fn agent(&self) -> Agent {
        Agent {
            name: self.name.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("invalid YAML frontmatter: {0}")]
    InvalidYaml(String),
    #[error("invalid agent name: {0}")]
    InvalidName(String),
    #[error("cannot derive agent name from path: {0}")]
    UnnamedFile(PathBuf),
}

#[derive(Debug, Default, Deserialize)]
struct RawFrontmatter {
    name: Option<String>,
    #[serde(default)]
    expertise: Vec<String>,
    #[serde(default)]
    activation_keywords: Vec<String>,
    #[serde(default)]
    principles: Vec<String>,
    focus: Option<String>,
    complexity_threshold: Option<ComplexityLevel>,
}

/// Parses an agent markdown document.
///
/// Documents without frontmatter are accepted: the name falls back to the
/// file stem and every list is empty.
pub fn parse_agent_md(content: &str, path: &Path) -> Result<AgentProfile, AgentError> {
    let raw = match frontmatter::split(content) {
        Some(doc) if !doc.frontmatter.trim().is_empty() => {
            serde_yaml::from_str::<RawFrontmatter>(doc.frontmatter)
                .map_err(|e| AgentError::InvalidYaml(e.to_string()))?
        }
        _ => RawFrontmatter::default(),
    };

    let name = match raw.name {
        Some(name) => {
            let name = name.trim().to_string();
            validate_name(&name).map_err(AgentError::InvalidName)?;
            name
        }
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(String::from)
            .ok_or_else(|| AgentError::UnnamedFile(path.to_path_buf()))?,
    };

    Ok(AgentProfile {
        name,
        keywords: clean_list(raw.activation_keywords),
        expertise: clean_list(raw.expertise),
        principles: clean_list(raw.principles),
        focus: raw
            .focus
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty()),
        complexity_threshold: raw.complexity_threshold.unwrap_or_default(),
        path: path.to_path_buf(),
    })
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
