//! Core data model for agent orchestration.
//!
//! Every value here is produced fresh per call; nothing is cached or shared
//! between orchestration passes.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A named persona with the keywords that activate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier (e.g., `security-engineer`).
    pub name: String,
    /// Activation keywords, matched as case-insensitive substrings.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Agent {
    pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Expertise signals pulled out of skill content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextHints {
    /// Strong signals ("requires X expertise").
    pub direct: Vec<String>,
    /// Weak signals ("consider X").
    pub subtle: Vec<String>,
}

impl ContextHints {
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.subtle.is_empty()
    }
}

/// An explicit `condition → agent[+agent]` rule from skill content.
///
/// Agent names are not checked against the catalog at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub condition: String,
    pub agents: Vec<String>,
}

/// Per-agent scores for one scoring pass.
///
/// Iterates (and serializes) in the order agents were supplied. Scores only
/// ever grow within a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreMap {
    entries: Vec<(String, u32)>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map with every agent at zero, in input order.
    pub fn for_agents(agents: &[Agent]) -> Self {
        let mut map = Self::new();
        for agent in agents {
            map.insert_zero(&agent.name);
        }
        map
    }

    fn insert_zero(&mut self, name: &str) {
        if !self.contains(name) {
            self.entries.push((name.to_string(), 0));
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.position(name).map(|idx| self.entries[idx].1)
    }

    /// Add points to a known agent. Returns false (and changes nothing) for
    /// names that were not part of the agent list.
    pub fn add(&mut self, name: &str, points: u32) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.entries[idx].1 = self.entries[idx].1.saturating_add(points);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ScoreMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, score) in &self.entries {
            map.serialize_entry(name, score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScoreMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoreMapVisitor;

        impl<'de> Visitor<'de> for ScoreMapVisitor {
            type Value = ScoreMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of agent names to scores")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ScoreMap, A::Error> {
                let mut map = ScoreMap::new();
                while let Some((name, score)) = access.next_entry::<String, u32>()? {
                    if let Some(idx) = map.position(&name) {
                        map.entries[idx].1 = score;
                    } else {
                        map.entries.push((name, score));
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ScoreMapVisitor)
    }
}

/// Unified output of one orchestration pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// Agents whose score passed the threshold, in agent input order.
    pub activated_agents: Vec<String>,
    pub hints: ContextHints,
    pub conditionals: Vec<ConditionalRule>,
    pub scores: ScoreMap,
}
