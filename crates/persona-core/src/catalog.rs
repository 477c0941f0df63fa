//! Agent and skill catalogs: directory scanning and discovery.
//!
//! Directories are scanned in priority order. Duplicate names keep the first
//! definition found; unreadable or invalid documents are recorded as errors
//! and skipped rather than failing the whole scan.

use crate::agents::{parse_agent_md, AgentError, AgentProfile};
use crate::config::Config;
use crate::skills::{parse_skill_md, SkillMetadata, SkillSource};
use crate::types::Agent;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// A document that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiscoveryError {
    /// Agent or skill name (file or directory name fallback).
    pub name: String,
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("agent not found: {name}\nSearched in:\n{}", list_dirs(.searched))]
    AgentNotFound { name: String, searched: Vec<PathBuf> },
    #[error("skill not found: {0}")]
    SkillNotFound(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn list_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|dir| format!("- {}", dir.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Everything discovered from the configured directories.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub agents: Vec<AgentProfile>,
    pub skills: Vec<SkillMetadata>,
    pub errors: Vec<DiscoveryError>,
    agent_dirs: Vec<PathBuf>,
}

impl Catalog {
    /// Discover agents and skills from the directories named in `config`.
    pub fn load(config: &Config) -> Self {
        let agent_dirs = config.agent_dirs();
        let (agents, mut errors) = discover_agents(&agent_dirs);

        let mut skill_dirs = vec![(config.skills_dir.clone(), SkillSource::BuiltIn)];
        if let Some(custom) = &config.custom_skills_dir {
            skill_dirs.push((custom.clone(), SkillSource::Custom));
        }
        let (skills, skill_errors) = discover_skills(&skill_dirs);
        errors.extend(skill_errors);

        debug!(
            agents = agents.len(),
            skills = skills.len(),
            errors = errors.len(),
            "loaded catalog"
        );

        Self {
            agents,
            skills,
            errors,
            agent_dirs,
        }
    }

    /// The name/keywords view of every agent, in catalog order.
    pub fn scoring_agents(&self) -> Vec<Agent> {
        self.agents.iter().map(AgentProfile::agent).collect()
    }

    pub fn agent(&self, name: &str) -> Option<&AgentProfile> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn skill(&self, name: &str) -> Option<&SkillMetadata> {
        self.skills.iter().find(|s| s.name == name)
    }

    /// Raw markdown of an agent's persona document.
    pub fn agent_document(&self, name: &str) -> Result<String, CatalogError> {
        find_agent_file(&self.agent_dirs, name)
    }

    /// Raw SKILL.md content of a discovered skill.
    pub fn skill_document(&self, name: &str) -> Result<String, CatalogError> {
        let skill = self
            .skill(name)
            .ok_or_else(|| CatalogError::SkillNotFound(name.to_string()))?;
        let path = skill.path.join("SKILL.md");
        fs::read_to_string(&path).map_err(|source| CatalogError::Read { path, source })
    }
}

/// Scan agent directories for `*.md` definitions.
///
/// Files within a directory are visited in file-name order so the catalog
/// order is stable across platforms.
pub fn discover_agents(dirs: &[PathBuf]) -> (Vec<AgentProfile>, Vec<DiscoveryError>) {
    let mut agents = Vec::new();
    let mut errors = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for dir in dirs {
        for path in sorted_entries(dir) {
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }

            let fallback_name = file_label(&path);
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read agent file");
                    errors.push(DiscoveryError {
                        name: fallback_name,
                        path,
                        error: format!("IO error: {e}"),
                    });
                    continue;
                }
            };

            match parse_agent_md(&content, &path) {
                Ok(agent) => {
                    if !seen_names.insert(agent.name.clone()) {
                        debug!(
                            name = %agent.name,
                            path = %path.display(),
                            "duplicate agent name, skipping"
                        );
                        continue;
                    }
                    agents.push(agent);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse agent file");
                    errors.push(agent_error(fallback_name, path, &e));
                }
            }
        }
    }

    (agents, errors)
}

fn agent_error(name: String, path: PathBuf, error: &AgentError) -> DiscoveryError {
    DiscoveryError {
        name,
        path,
        error: error.to_string(),
    }
}

/// Scan skill directories for `<skill>/SKILL.md` documents.
///
/// The result is sorted by skill name.
pub fn discover_skills(
    dirs: &[(PathBuf, SkillSource)],
) -> (Vec<SkillMetadata>, Vec<DiscoveryError>) {
    let mut skills = Vec::new();
    let mut errors = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for (dir, source) in dirs {
        for skill_dir in sorted_entries(dir) {
            if !skill_dir.is_dir() {
                continue;
            }

            let skill_md_path = skill_dir.join("SKILL.md");
            if !skill_md_path.exists() {
                debug!(path = %skill_dir.display(), "no SKILL.md found, skipping");
                continue;
            }

            let skill_name = file_label(&skill_dir);
            let content = match fs::read_to_string(&skill_md_path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %skill_md_path.display(), error = %e, "failed to read SKILL.md");
                    errors.push(DiscoveryError {
                        name: skill_name,
                        path: skill_md_path,
                        error: format!("IO error: {e}"),
                    });
                    continue;
                }
            };

            match parse_skill_md(&content, skill_dir.clone(), *source) {
                Ok(metadata) => {
                    if !seen_names.insert(metadata.name.clone()) {
                        debug!(
                            name = %metadata.name,
                            path = %skill_dir.display(),
                            "duplicate skill name, skipping"
                        );
                        continue;
                    }
                    skills.push(metadata);
                }
                Err(e) => {
                    warn!(path = %skill_md_path.display(), error = %e, "failed to parse SKILL.md");
                    errors.push(DiscoveryError {
                        name: skill_name,
                        path: skill_md_path,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    skills.sort_by(|a, b| a.name.cmp(&b.name));
    (skills, errors)
}

/// Find `<dir>/<name>.md` in the first directory that has it.
pub fn find_agent_file(dirs: &[PathBuf], name: &str) -> Result<String, CatalogError> {
    // Names are single path components; anything else cannot be an agent.
    let valid = !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..";
    if valid {
        for dir in dirs {
            let path = dir.join(format!("{name}.md"));
            match fs::read_to_string(&path) {
                Ok(content) => return Ok(content),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => return Err(CatalogError::Read { path, source }),
            }
        }
    }

    Err(CatalogError::AgentNotFound {
        name: name.to_string(),
        searched: dirs.to_vec(),
    })
}

/// Directory entries sorted by path; missing or unreadable directories yield
/// nothing.
fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        debug!(path = %dir.display(), "catalog directory not found, skipping");
        return Vec::new();
    }

    match fs::read_dir(dir) {
        Ok(entries) => {
            let mut paths: Vec<PathBuf> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
            paths.sort();
            paths
        }
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "failed to read catalog directory");
            Vec::new()
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
