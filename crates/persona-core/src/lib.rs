pub mod activation;
pub mod agents;
pub mod catalog;
pub mod config;
pub mod detection;
pub mod frontmatter;
pub mod orchestration;
pub mod persona;
pub mod skills;
pub mod types;

pub use activation::{activate, Activation, ActivationRequest, ActivationStrategy};
pub use agents::{AgentProfile, ComplexityLevel};
pub use catalog::Catalog;
pub use config::Config;
pub use orchestration::{analyze_skill_and_activate_agents, ScoringPolicy};
pub use types::*;
