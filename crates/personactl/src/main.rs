//! personactl - CLI client for personad
//!
//! `analyze` and `detect` run locally against the workspace catalog; the
//! remaining commands go through the daemon.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod client;
mod render;

use clap::{Parser, Subcommand};
use client::{ActivateRequest, Client, ClientError};
use persona_core::detection::detect_complexity;
use persona_core::{analyze_skill_and_activate_agents, Catalog, Config};
use std::path::{Path, PathBuf};

/// CLI client for the personad routing daemon.
#[derive(Parser)]
#[command(name = "personactl")]
#[command(about = "Route requests to expert agent personas")]
#[command(version)]
struct Cli {
    /// Daemon address (default: http://127.0.0.1:7710)
    #[arg(long, global = true, env = "PERSONAD_ADDR")]
    addr: Option<String>,

    /// Auth token for daemon API
    #[arg(long, global = true, env = "PERSONAD_TOKEN")]
    token: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score agents against a skill document (no daemon required)
    Analyze {
        /// User message to route
        message: String,

        /// Path to a SKILL.md file
        #[arg(long)]
        skill: Option<PathBuf>,

        /// Config file path (overrides .persona/config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the activation threshold
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Score how complex a request is (no daemon required)
    Detect {
        /// User message to score
        message: String,

        /// Config file path (overrides .persona/config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the complexity threshold
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Activate agents for a message and print their personas
    Activate {
        /// User message to route
        message: String,

        /// Force an agent (repeatable); skips orchestration
        #[arg(long = "agent")]
        agents: Vec<String>,

        /// Catalog skill guiding the request
        #[arg(long)]
        skill: Option<String>,
    },

    /// List skills, or show one skill's workflow
    Skills {
        /// Skill name
        name: Option<String>,
    },

    /// List agents
    Agents,

    /// Print an agent's persona document
    Persona {
        /// Agent name
        name: String,
    },

    /// Rescan agent and skill directories
    Reload,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let addr = cli
        .addr
        .unwrap_or_else(|| "http://127.0.0.1:7710".to_string());
    let client = Client::new(&addr, cli.token.as_deref());

    let requires_daemon = !matches!(
        cli.command,
        Command::Analyze { .. } | Command::Detect { .. }
    );
    if requires_daemon {
        if let Err(e) = client.wait_for_ready().await {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }

    let json = cli.json;
    let result = match cli.command {
        Command::Analyze {
            message,
            skill,
            config,
            threshold,
        } => run_analyze(&message, skill.as_deref(), config.as_deref(), threshold, json),
        Command::Detect {
            message,
            config,
            threshold,
        } => run_detect(&message, config.as_deref(), threshold, json),
        Command::Activate {
            message,
            agents,
            skill,
        } => run_activate(&client, message, agents, skill, json).await,
        Command::Skills { name } => run_skills(&client, name.as_deref(), json).await,
        Command::Agents => run_agents(&client, json).await,
        Command::Persona { name } => run_persona(&client, &name).await,
        Command::Reload => run_reload(&client, json).await,
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run_analyze(
    message: &str,
    skill: Option<&Path>,
    config: Option<&Path>,
    threshold: Option<u32>,
    json: bool,
) -> Result<(), ClientError> {
    let workspace_root = find_workspace_root()?;
    let mut config = load_workspace_config(&workspace_root, config)?;
    if let Some(threshold) = threshold {
        config.activation_threshold = threshold;
    }

    let skill_content = match skill {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .map_err(|e| ClientError::IoError(format!("{}: {}", path.display(), e)))?,
        ),
        None => None,
    };

    let catalog = Catalog::load(&config);
    let result = analyze_skill_and_activate_agents(
        skill_content.as_deref(),
        message,
        &catalog.scoring_agents(),
        &config.scoring_policy(),
    );

    if json {
        render::print_json(&result);
    } else {
        render::print_orchestration(&result);
    }
    Ok(())
}

fn run_detect(
    message: &str,
    config: Option<&Path>,
    threshold: Option<u32>,
    json: bool,
) -> Result<(), ClientError> {
    let threshold = match threshold {
        Some(threshold) => threshold,
        None => {
            let workspace_root = find_workspace_root()?;
            load_workspace_config(&workspace_root, config)?.complexity_threshold
        }
    };

    let report = detect_complexity(message, threshold);
    if json {
        render::print_json(&report);
    } else {
        render::print_complexity(&report);
    }
    Ok(())
}

async fn run_activate(
    client: &Client,
    message: String,
    agents: Vec<String>,
    skill: Option<String>,
    json: bool,
) -> Result<(), ClientError> {
    let req = ActivateRequest {
        user_message: message,
        force_agents: agents,
        skill,
    };
    let resp = client.activate(&req).await?;

    if json {
        render::print_json(&resp);
    } else {
        render::print_activation(&resp);
    }
    Ok(())
}

async fn run_skills(client: &Client, name: Option<&str>, json: bool) -> Result<(), ClientError> {
    match name {
        Some(name) => {
            let resp = client.get_skill(name).await?;
            if json {
                render::print_json(&resp);
            } else {
                render::print_skill_details(&resp);
            }
        }
        None => {
            let resp = client.list_skills().await?;
            if json {
                render::print_json(&resp);
            } else {
                render::print_skill_list(&resp.skills, &resp.errors);
            }
        }
    }
    Ok(())
}

async fn run_agents(client: &Client, json: bool) -> Result<(), ClientError> {
    let resp = client.list_agents().await?;
    if json {
        render::print_json(&resp);
    } else {
        render::print_agent_list(&resp.agents, &resp.errors);
    }
    Ok(())
}

async fn run_persona(client: &Client, name: &str) -> Result<(), ClientError> {
    let resp = client.get_agent(name).await?;
    print!("{}", resp.document);
    if !resp.document.ends_with('\n') {
        println!();
    }
    Ok(())
}

async fn run_reload(client: &Client, json: bool) -> Result<(), ClientError> {
    let resp = client.reload().await?;
    if json {
        render::print_json(&resp);
    } else {
        render::print_reload(&resp);
    }
    Ok(())
}

fn find_workspace_root() -> Result<PathBuf, ClientError> {
    // Try to find git root
    let output = std::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let path = String::from_utf8_lossy(&out.stdout).trim().to_string();
            Ok(PathBuf::from(path))
        }
        _ => {
            // Fall back to current directory
            std::env::current_dir().map_err(|e| ClientError::IoError(e.to_string()))
        }
    }
}

fn load_workspace_config(
    workspace_root: &Path,
    config_override: Option<&Path>,
) -> Result<Config, ClientError> {
    if let Some(path) = config_override {
        if !path.exists() {
            return Err(ClientError::Config(format!(
                "config override not found: {}",
                path.display()
            )));
        }
    }

    Config::load(workspace_root, config_override).map_err(|e| ClientError::Config(e.to_string()))
}
