//! personad - agent persona routing daemon
//!
//! Serves the agent and skill catalogs of one workspace over a local HTTP
//! API and answers activation requests against them.

pub mod server;

use std::path::PathBuf;
use std::sync::Arc;

use eyre::WrapErr;
use persona_core::Config;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use server::{AppState, Routing};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 7710;

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// HTTP server port (default: 7710).
    pub port: u16,
    /// Auth token for the HTTP API (optional).
    pub auth_token: Option<String>,
    /// Workspace whose `.persona/config` and catalogs are served.
    pub workspace_root: PathBuf,
    /// Extra config file layered over the workspace config.
    pub config_path: Option<PathBuf>,
    /// Command-line overrides, applied last.
    pub overrides: ConfigOverrides,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auth_token: std::env::var("PERSONAD_TOKEN").ok(),
            workspace_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_path: None,
            overrides: ConfigOverrides::default(),
        }
    }
}

/// Settings given on the command line; they win over every config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub activation_threshold: Option<u32>,
    pub max_agents_per_request: Option<usize>,
    pub verbose: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(threshold) = self.activation_threshold {
            config.activation_threshold = threshold;
        }
        if let Some(max) = self.max_agents_per_request {
            config.max_agents_per_request = max;
        }
        if self.verbose {
            config.verbose = true;
        }
    }
}

/// Where the daemon's configuration comes from; re-read on catalog reload.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub workspace_root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

impl ConfigSource {
    pub fn load(&self) -> eyre::Result<Config> {
        let mut config = Config::load(&self.workspace_root, self.config_path.as_deref())
            .wrap_err_with(|| {
                format!(
                    "failed to load config for workspace {}",
                    self.workspace_root.display()
                )
            })?;
        self.overrides.apply(&mut config);
        Ok(config)
    }
}

/// Daemon state.
#[derive(Debug)]
pub struct Daemon {
    port: u16,
    state: Arc<AppState>,
    shutdown: CancellationToken,
}

impl Daemon {
    /// Load configuration and catalogs for the workspace.
    pub fn new(config: DaemonConfig) -> eyre::Result<Self> {
        let source = ConfigSource {
            workspace_root: config.workspace_root,
            config_path: config.config_path,
            overrides: config.overrides,
        };
        let routing = Routing::load(source.load()?);
        for err in &routing.catalog.errors {
            warn!(name = %err.name, path = %err.path.display(), error = %err.error, "skipped catalog entry");
        }

        let state = Arc::new(AppState {
            source,
            routing: RwLock::new(routing),
            auth_token: config.auth_token,
        });

        Ok(Self {
            port: config.port,
            state,
            shutdown: CancellationToken::new(),
        })
    }

    /// Shared handler state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve the HTTP API until shutdown is requested.
    pub async fn run(&self) -> eyre::Result<()> {
        info!(port = self.port, workspace = %self.state.source.workspace_root.display(), "personad starting");
        if self.state.auth_token.is_some() {
            info!("auth token: enabled");
        }
        {
            let routing = self.state.routing.read().await;
            info!(
                agents = routing.catalog.agents.len(),
                skills = routing.catalog.skills.len(),
                "catalog loaded"
            );
        }

        server::start_server(Arc::clone(&self.state), self.port, self.shutdown.clone()).await
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn overrides_win_over_config_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".persona")).unwrap();
        std::fs::write(
            tmp.path().join(".persona/config"),
            "activation_threshold=20\nmax_agents_per_request=5\n",
        )
        .unwrap();

        let source = ConfigSource {
            workspace_root: tmp.path().to_path_buf(),
            config_path: None,
            overrides: ConfigOverrides {
                activation_threshold: Some(12),
                max_agents_per_request: None,
                verbose: true,
            },
        };
        let config = source.load().unwrap();
        assert_eq!(config.activation_threshold, 12);
        assert_eq!(config.max_agents_per_request, 5);
        assert!(config.verbose);
    }

    #[test]
    fn invalid_config_fails_startup() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".persona")).unwrap();
        std::fs::write(tmp.path().join(".persona/config"), "verbose=sometimes\n").unwrap();

        let err = Daemon::new(DaemonConfig {
            workspace_root: tmp.path().to_path_buf(),
            ..DaemonConfig::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }

    #[test]
    fn shutdown_cancels_token() {
        let tmp = TempDir::new().unwrap();
        let daemon = Daemon::new(DaemonConfig {
            workspace_root: tmp.path().to_path_buf(),
            auth_token: None,
            ..DaemonConfig::default()
        })
        .unwrap();
        assert!(!daemon.is_shutdown());
        daemon.shutdown();
        assert!(daemon.is_shutdown());
    }
}
