//! Skill document types and parsing.
//!
//! A skill is a directory containing `SKILL.md`: YAML frontmatter with a
//! `name` and `description`, followed by a markdown workflow whose `###`
//! headings are the workflow steps.

use crate::frontmatter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a skill was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSource {
    /// Shipped with the catalog (`skills_dir`).
    BuiltIn,
    /// User-provided (`custom_skills_dir`).
    Custom,
}

impl SkillSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuiltIn => "built-in",
            Self::Custom => "custom",
        }
    }
}

/// Metadata extracted from a SKILL.md frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Skill name (1-64 chars, lowercase alphanumeric + hyphens).
    pub name: String,
    /// What the skill does and when to use it (1-1024 chars).
    pub description: String,
    /// Absolute path to the skill directory.
    pub path: PathBuf,
    pub source: SkillSource,
}

/// One `###` section of a skill workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub name: String,
    /// Non-blank lines under the heading, trimmed.
    pub context: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkillError {
    #[error("missing YAML frontmatter")]
    MissingFrontmatter,
    #[error("invalid YAML frontmatter: {0}")]
    InvalidYaml(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid description: {0}")]
    InvalidDescription(String),
}

#[derive(Debug, Deserialize)]
struct RawFrontmatter {
    name: Option<String>,
    description: Option<String>,
}

/// Validates a skill or agent name.
///
/// Rules:
/// - 1-64 characters
/// - Lowercase letters, numbers, and hyphens only
/// - Must not start or end with hyphen
/// - Must not contain consecutive hyphens
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if name.len() > 64 {
        return Err(format!("name exceeds 64 characters (got {})", name.len()));
    }
    if name.starts_with('-') {
        return Err("name cannot start with hyphen".to_string());
    }
    if name.ends_with('-') {
        return Err("name cannot end with hyphen".to_string());
    }
    if name.contains("--") {
        return Err("name cannot contain consecutive hyphens".to_string());
    }
    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
    {
        return Err(format!(
            "invalid character '{c}': only lowercase letters, numbers, and hyphens allowed"
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), SkillError> {
    if description.is_empty() {
        return Err(SkillError::InvalidDescription(
            "description cannot be empty".to_string(),
        ));
    }
    if description.len() > 1024 {
        return Err(SkillError::InvalidDescription(format!(
            "description exceeds 1024 characters (got {})",
            description.len()
        )));
    }
    Ok(())
}

/// Parses SKILL.md content and extracts validated metadata.
pub fn parse_skill_md(
    content: &str,
    path: PathBuf,
    source: SkillSource,
) -> Result<SkillMetadata, SkillError> {
    let doc = frontmatter::split(content).ok_or(SkillError::MissingFrontmatter)?;

    let raw: RawFrontmatter = serde_yaml::from_str(doc.frontmatter)
        .map_err(|e| SkillError::InvalidYaml(e.to_string()))?;

    let name = raw.name.ok_or(SkillError::MissingField("name"))?;
    validate_name(&name).map_err(SkillError::InvalidName)?;

    let description = raw
        .description
        .ok_or(SkillError::MissingField("description"))?;
    validate_description(&description)?;

    Ok(SkillMetadata {
        name,
        description,
        path,
        source,
    })
}

/// Returns the markdown body after the frontmatter.
pub fn extract_body(content: &str) -> Result<&str, SkillError> {
    frontmatter::split(content)
        .map(|doc| doc.body)
        .ok_or(SkillError::MissingFrontmatter)
}

/// Splits a skill workflow into steps at each `### ` heading.
///
/// Lines before the first heading are not part of any step.
pub fn parse_steps(markdown: &str) -> Vec<WorkflowStep> {
    let mut steps = Vec::new();
    let mut current: Option<WorkflowStep> = None;

    for line in markdown.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("### ") {
            if let Some(step) = current.take() {
                steps.push(step);
            }
            current = Some(WorkflowStep {
                name: heading.trim().to_string(),
                context: Vec::new(),
            });
        } else if let Some(step) = current.as_mut() {
            if !trimmed.is_empty() {
                step.context.push(trimmed.to_string());
            }
        }
    }

    if let Some(step) = current {
        steps.push(step);
    }
    steps
}
