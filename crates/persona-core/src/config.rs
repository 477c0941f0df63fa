//! Configuration parsing for agent routing.
//!
//! Uses a key=value format (`.persona/config`).
//! Precedence: CLI flags > `--config` file > `.persona/config` > defaults.

use crate::orchestration::ScoringPolicy;
use crate::persona::PersonaDetail;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Workspace-relative location of the default config file.
pub const WORKSPACE_CONFIG_PATH: &str = ".persona/config";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid config line: {0}")]
    InvalidLine(String),
    #[error("invalid boolean value for {key}: {value}")]
    InvalidBool { key: String, value: String },
    #[error("invalid integer value for {key}: {value}")]
    InvalidInt { key: String, value: String },
}

/// Catalog locations and routing policy.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    // Catalog directories
    /// Built-in agent definitions (default: agents/).
    pub agents_dir: PathBuf,
    /// User agent definitions; shadows built-ins on name lookup.
    pub custom_agents_dir: Option<PathBuf>,
    /// Built-in skills (default: skills/).
    pub skills_dir: PathBuf,
    pub custom_skills_dir: Option<PathBuf>,

    // Scoring
    pub activation_threshold: u32,
    pub direct_hint_points: u32,
    pub subtle_hint_points: u32,
    pub conditional_points: u32,

    // Activation
    /// Maximum agents returned by activation (0 = unlimited, default: 3).
    pub max_agents_per_request: usize,
    pub persona_detail: PersonaDetail,
    /// Score at which a request counts as complex (default: 3).
    pub complexity_threshold: u32,

    // Display
    /// Log every activation at info level (default: false).
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        let policy = ScoringPolicy::default();
        Self {
            agents_dir: PathBuf::from("agents"),
            custom_agents_dir: dirs::home_dir().map(|h| h.join(".persona/agents")),
            skills_dir: PathBuf::from("skills"),
            custom_skills_dir: dirs::home_dir().map(|h| h.join(".persona/skills")),
            activation_threshold: policy.activation_threshold,
            direct_hint_points: policy.direct_hint_points,
            subtle_hint_points: policy.subtle_hint_points,
            conditional_points: policy.conditional_points,
            max_agents_per_request: 3,
            persona_detail: PersonaDetail::Full,
            complexity_threshold: 3,
            verbose: false,
        }
    }
}

impl Config {
    /// Load config from a file, merging with defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.load_file(path)?;
        Ok(config)
    }

    /// Load the workspace config if present, then an explicit override file.
    pub fn load(workspace_root: &Path, override_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let workspace_config = workspace_root.join(WORKSPACE_CONFIG_PATH);
        if workspace_config.is_file() {
            config.load_file(&workspace_config)?;
        }
        if let Some(path) = override_path {
            config.load_file(path)?;
        }
        config.resolve_paths(workspace_root);
        Ok(config)
    }

    /// Load and merge values from a config file.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        self.parse_content(&content, &path.display().to_string())
    }

    /// Parse config content (key=value format).
    fn parse_content(&mut self, content: &str, source: &str) -> Result<(), ConfigError> {
        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine(line.to_string()));
            };

            let key = key.trim();
            let value = Self::unquote(value.trim());

            self.apply_value(key, &value, source)?;
        }
        Ok(())
    }

    /// Remove surrounding quotes from a value.
    fn unquote(value: &str) -> String {
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            return value[1..value.len() - 1].to_string();
        }
        value.to_string()
    }

    fn apply_value(&mut self, key: &str, value: &str, source: &str) -> Result<(), ConfigError> {
        match key {
            "agents_dir" => self.agents_dir = expand_home(value),
            "custom_agents_dir" => self.custom_agents_dir = Self::optional_path(value),
            "skills_dir" => self.skills_dir = expand_home(value),
            "custom_skills_dir" => self.custom_skills_dir = Self::optional_path(value),
            "activation_threshold" => self.activation_threshold = Self::parse_int(key, value)?,
            "direct_hint_points" => self.direct_hint_points = Self::parse_int(key, value)?,
            "subtle_hint_points" => self.subtle_hint_points = Self::parse_int(key, value)?,
            "conditional_points" => self.conditional_points = Self::parse_int(key, value)?,
            "max_agents_per_request" => {
                self.max_agents_per_request = Self::parse_int(key, value)?;
            }
            "persona_detail" => {
                self.persona_detail = match value {
                    "full" => PersonaDetail::Full,
                    "minimal" => PersonaDetail::Minimal,
                    _ => {
                        return Err(ConfigError::InvalidLine(format!(
                            "persona_detail must be 'full' or 'minimal', got '{value}'"
                        )))
                    }
                }
            }
            "complexity_threshold" => self.complexity_threshold = Self::parse_int(key, value)?,
            "verbose" => self.verbose = Self::parse_bool(key, value)?,
            _ => {
                warn!(key, source, "unknown config key, ignoring");
            }
        }
        Ok(())
    }

    fn optional_path(value: &str) -> Option<PathBuf> {
        if value.is_empty() {
            None
        } else {
            Some(expand_home(value))
        }
    }

    fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
        value.parse().map_err(|_| ConfigError::InvalidInt {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Ok(true),
            "false" | "0" | "no" | "n" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Resolve relative catalog paths against a workspace root.
    pub fn resolve_paths(&mut self, workspace_root: &Path) {
        if self.agents_dir.is_relative() {
            self.agents_dir = workspace_root.join(&self.agents_dir);
        }
        if self.skills_dir.is_relative() {
            self.skills_dir = workspace_root.join(&self.skills_dir);
        }
        for dir in [&mut self.custom_agents_dir, &mut self.custom_skills_dir]
            .into_iter()
            .flatten()
        {
            if dir.is_relative() {
                *dir = workspace_root.join(&*dir);
            }
        }
    }

    /// Point values and threshold for the scorer.
    pub fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            direct_hint_points: self.direct_hint_points,
            subtle_hint_points: self.subtle_hint_points,
            conditional_points: self.conditional_points,
            activation_threshold: self.activation_threshold,
        }
    }

    /// Agent directories in lookup order: custom first, then built-in.
    pub fn agent_dirs(&self) -> Vec<PathBuf> {
        self.custom_agents_dir
            .iter()
            .cloned()
            .chain(std::iter::once(self.agents_dir.clone()))
            .collect()
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if value == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(value)),
        _ => PathBuf::from(value),
    }
}
