//! Output rendering for personactl CLI.
//!
//! Formats orchestration, activation and catalog information for terminal
//! display.

use persona_core::agents::AgentProfile;
use persona_core::catalog::DiscoveryError;
use persona_core::detection::ComplexityReport;
use persona_core::skills::SkillMetadata;
use persona_core::OrchestrationResult;

use crate::client::{ActivateResponse, GetSkillResponse, ReloadResponse};

/// Print pretty JSON for `--json` output.
pub fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: failed to serialize output: {e}"),
    }
}

/// Print the hints, rules and scores behind an orchestration decision.
pub fn print_orchestration(result: &OrchestrationResult) {
    println!("Context hints:");
    if result.hints.is_empty() {
        println!("  (none)");
    }
    for hint in &result.hints.direct {
        println!("  direct  {hint}");
    }
    for hint in &result.hints.subtle {
        println!("  subtle  {hint}");
    }

    println!();
    println!("Conditional rules:");
    if result.conditionals.is_empty() {
        println!("  (none)");
    }
    for rule in &result.conditionals {
        println!("  {} → {}", rule.condition, rule.agents.join(" + "));
    }

    println!();
    println!("{:<32}  {:>5}  {}", "AGENT", "SCORE", "ACTIVE");
    println!("{}", "-".repeat(48));
    for (name, score) in result.scores.iter() {
        let active = if result.activated_agents.iter().any(|a| a == name) {
            "yes"
        } else {
            ""
        };
        println!("{:<32}  {:>5}  {}", truncate(name, 32), score, active);
    }

    println!();
    print_activated(&result.activated_agents);
}

/// Print an activation result followed by the persona block.
pub fn print_activation(resp: &ActivateResponse) {
    let activation = &resp.activation;
    println!("Request:  {}", resp.request_id);
    println!("Strategy: {}", activation.strategy.as_str());
    print_activated(&activation.activated_agents);
    for err in &activation.errors {
        println!("  warning: {err}");
    }

    if !activation.personas.is_empty() {
        println!();
        print!("{}", activation.personas);
    }
}

fn print_activated(agents: &[String]) {
    if agents.is_empty() {
        println!("Activated: (none)");
    } else {
        println!("Activated: {}", agents.join(", "));
    }
}

/// Print a complexity report.
pub fn print_complexity(report: &ComplexityReport) {
    let verdict = if report.is_complex { "complex" } else { "simple" };
    println!("Complexity: {} (score {})", verdict, report.score);
    if !report.reasons.is_empty() {
        println!("  Reasons:  {}", report.reasons.join(", "));
    }
    if !report.keywords.is_empty() {
        println!("  Keywords: {}", report.keywords.join(", "));
    }
}

/// Print a list of skills in tabular format.
pub fn print_skill_list(skills: &[SkillMetadata], errors: &[DiscoveryError]) {
    if skills.is_empty() {
        println!("No skills found.");
    } else {
        println!("{:<28}  {:<8}  {}", "NAME", "SOURCE", "DESCRIPTION");
        println!("{}", "-".repeat(90));
        for skill in skills {
            println!(
                "{:<28}  {:<8}  {}",
                truncate(&skill.name, 28),
                skill.source.as_str(),
                truncate(&skill.description, 50),
            );
        }
        println!();
        println!("{} skill(s)", skills.len());
    }
    print_discovery_errors(errors);
}

/// Print one skill with its workflow steps.
pub fn print_skill_details(resp: &GetSkillResponse) {
    let skill = &resp.skill;
    println!("Skill: {}", skill.name);
    println!();
    println!("  Description: {}", skill.description);
    println!("  Source:      {}", skill.source.as_str());
    println!("  Path:        {}", skill.path.display());

    if !resp.steps.is_empty() {
        println!();
        println!("  Steps:");
        for (i, step) in resp.steps.iter().enumerate() {
            println!("    {}. {}", i + 1, step.name);
            for line in &step.context {
                println!("       {line}");
            }
        }
    }
}

/// Print a list of agents in tabular format.
pub fn print_agent_list(agents: &[AgentProfile], errors: &[DiscoveryError]) {
    if agents.is_empty() {
        println!("No agents found.");
    } else {
        println!("{:<28}  {:<10}  {}", "NAME", "COMPLEXITY", "KEYWORDS");
        println!("{}", "-".repeat(90));
        for agent in agents {
            println!(
                "{:<28}  {:<10}  {}",
                truncate(&agent.name, 28),
                agent.complexity_threshold.as_str(),
                truncate(&agent.keywords.join(", "), 48),
            );
        }
        println!();
        println!("{} agent(s)", agents.len());
    }
    print_discovery_errors(errors);
}

/// Print the outcome of a catalog reload.
pub fn print_reload(resp: &ReloadResponse) {
    println!(
        "Reloaded catalog: {} agent(s), {} skill(s)",
        resp.agents, resp.skills
    );
    print_discovery_errors(&resp.errors);
}

fn print_discovery_errors(errors: &[DiscoveryError]) {
    if errors.is_empty() {
        return;
    }
    println!();
    println!("Skipped {} invalid file(s):", errors.len());
    for err in errors {
        println!("  {} ({}): {}", err.name, err.path.display(), err.error);
    }
}

/// Truncate a string to max length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("→→→→→→", 5), "→→...");
    }
}
