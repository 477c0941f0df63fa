//! personad - agent persona routing daemon
//!
//! Main entry point for the daemon binary.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::path::PathBuf;

use clap::Parser;
use eyre::WrapErr;
use personad::{ConfigOverrides, Daemon, DaemonConfig, DEFAULT_PORT};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "personad", about = "Agent persona routing daemon", version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Workspace root (default: current directory)
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Config file layered over .persona/config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bearer token required by the HTTP API
    #[arg(long, env = "PERSONAD_TOKEN")]
    token: Option<String>,

    /// Override the activation threshold
    #[arg(long)]
    threshold: Option<u32>,

    /// Override the per-request agent cap (0 = unlimited)
    #[arg(long)]
    max_agents: Option<usize>,

    /// Log every activation
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let mut config = DaemonConfig {
        port: cli.port,
        auth_token: cli.token,
        config_path: cli.config,
        overrides: ConfigOverrides {
            activation_threshold: cli.threshold,
            max_agents_per_request: cli.max_agents,
            verbose: cli.verbose,
        },
        ..Default::default()
    };
    if let Some(workspace) = cli.workspace {
        config.workspace_root = workspace;
    }

    let daemon = Daemon::new(config).wrap_err("failed to initialize daemon")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to create tokio runtime")?;

    runtime.block_on(async {
        let server = daemon.run();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => return result,
            () = shutdown_signal() => daemon.shutdown(),
        }

        // Let in-flight requests drain.
        server.await
    })
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigint.recv() => info!("received SIGINT, initiating graceful shutdown"),
                    _ = sigterm.recv() => info!("received SIGTERM, initiating graceful shutdown"),
                }
            }
            _ => {
                error!("failed to register signal handlers, falling back to ctrl-c");
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("received SIGINT, initiating graceful shutdown");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received SIGINT, initiating graceful shutdown");
        }
    }
}
