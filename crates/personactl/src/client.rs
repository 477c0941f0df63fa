//! HTTP client for the personad daemon.
//!
//! Communicates with personad via its local HTTP API.

use persona_core::activation::Activation;
use persona_core::agents::AgentProfile;
use persona_core::catalog::DiscoveryError;
use persona_core::skills::{SkillMetadata, WorkflowStep};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running at {addr}\n  → start with: personad\n  → or set PERSONAD_ADDR if using a different address")]
    ConnectionFailed { addr: String },

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("unauthorized: check PERSONAD_TOKEN env var or --token flag")]
    Unauthorized,

    #[error(
        "daemon not ready after {timeout_ms}ms at {addr}\n  → ensure personad is running\n  → check PERSONAD_TOKEN if auth is enabled"
    )]
    DaemonNotReady { addr: String, timeout_ms: u64 },
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            let addr = e
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            ClientError::ConnectionFailed { addr }
        } else {
            ClientError::HttpError {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            }
        }
    }
}

/// Request payload for POST /activate.
#[derive(Debug, Serialize)]
pub struct ActivateRequest {
    pub user_message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub force_agents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
}

/// Response from POST /activate.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivateResponse {
    pub request_id: String,
    #[serde(flatten)]
    pub activation: Activation,
}

/// Response from GET /skills.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListSkillsResponse {
    pub skills: Vec<SkillMetadata>,
    #[serde(default)]
    pub errors: Vec<DiscoveryError>,
}

/// Response from GET /skills/{name}.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetSkillResponse {
    pub skill: SkillMetadata,
    pub body: String,
    pub steps: Vec<WorkflowStep>,
}

/// Response from GET /agents.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListAgentsResponse {
    pub agents: Vec<AgentProfile>,
    #[serde(default)]
    pub errors: Vec<DiscoveryError>,
}

/// Response from GET /agents/{name}.
#[derive(Debug, Deserialize)]
pub struct GetAgentResponse {
    pub name: String,
    pub document: String,
}

/// Response from POST /catalog/reload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub agents: usize,
    pub skills: usize,
    #[serde(default)]
    pub errors: Vec<DiscoveryError>,
}

/// Error response from API.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Default total timeout for daemon readiness probe.
const DEFAULT_READY_TIMEOUT_MS: u64 = 5000;

/// Initial backoff delay for readiness probe.
const INITIAL_BACKOFF_MS: u64 = 200;

/// HTTP client for personad.
#[derive(Debug)]
pub struct Client {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            http: reqwest::Client::new(),
        }
    }

    /// Returns the daemon address (for error messages).
    pub fn addr(&self) -> &str {
        &self.base_url
    }

    /// Check if daemon is healthy by probing /health endpoint.
    ///
    /// Returns Ok(true) if healthy, Ok(false) if unhealthy response,
    /// Err if connection failed.
    pub async fn check_health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).headers(self.headers()).send().await?;
        Ok(response.status().is_success())
    }

    /// Wait for daemon to become ready with exponential backoff.
    ///
    /// Probes /health for up to 5s, starting at 200ms between attempts.
    pub async fn wait_for_ready(&self) -> Result<(), ClientError> {
        self.wait_for_ready_with_timeout(DEFAULT_READY_TIMEOUT_MS)
            .await
    }

    /// Wait for daemon to become ready with custom timeout.
    pub async fn wait_for_ready_with_timeout(&self, timeout_ms: u64) -> Result<(), ClientError> {
        let start = std::time::Instant::now();
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            match self.check_health().await {
                Ok(true) => return Ok(()),
                Ok(false) | Err(_) => {
                    let elapsed = start.elapsed().as_millis() as u64;
                    if elapsed >= timeout_ms {
                        return Err(ClientError::DaemonNotReady {
                            addr: self.base_url.clone(),
                            timeout_ms,
                        });
                    }

                    eprintln!(
                        "waiting for daemon at {} (retrying in {}ms)",
                        self.base_url, backoff_ms
                    );

                    let remaining = timeout_ms.saturating_sub(elapsed);
                    let sleep_ms = backoff_ms.min(remaining);
                    tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)).await;

                    backoff_ms = backoff_ms.saturating_mul(2);
                }
            }
        }
    }

    /// Build headers with optional auth token.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Handle error response from API.
    async fn handle_error(&self, response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();

        if status == 401 {
            return ClientError::Unauthorized;
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error)
            .unwrap_or_else(|_| "unknown error".to_string());

        if status == 404 {
            return ClientError::NotFound(message);
        }

        ClientError::HttpError { status, message }
    }

    async fn parse<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, ClientError> {
        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Activate agents for a message.
    /// POST /activate
    pub async fn activate(&self, req: &ActivateRequest) -> Result<ActivateResponse, ClientError> {
        let url = format!("{}/activate", self.base_url);
        let response = self
            .http
            .post(&url)
            .headers(self.headers())
            .json(req)
            .send()
            .await?;

        self.parse(response).await
    }

    /// List skills.
    /// GET /skills
    pub async fn list_skills(&self) -> Result<ListSkillsResponse, ClientError> {
        let url = format!("{}/skills", self.base_url);
        let response = self.http.get(&url).headers(self.headers()).send().await?;
        self.parse(response).await
    }

    /// Get a skill with its workflow steps.
    /// GET /skills/{name}
    pub async fn get_skill(&self, name: &str) -> Result<GetSkillResponse, ClientError> {
        let url = format!("{}/skills/{}", self.base_url, urlencoding::encode(name));
        let response = self.http.get(&url).headers(self.headers()).send().await?;
        self.parse(response).await
    }

    /// List agents.
    /// GET /agents
    pub async fn list_agents(&self) -> Result<ListAgentsResponse, ClientError> {
        let url = format!("{}/agents", self.base_url);
        let response = self.http.get(&url).headers(self.headers()).send().await?;
        self.parse(response).await
    }

    /// Get an agent's persona document.
    /// GET /agents/{name}
    pub async fn get_agent(&self, name: &str) -> Result<GetAgentResponse, ClientError> {
        let url = format!("{}/agents/{}", self.base_url, urlencoding::encode(name));
        let response = self.http.get(&url).headers(self.headers()).send().await?;
        self.parse(response).await
    }

    /// Rescan catalogs and re-read config.
    /// POST /catalog/reload
    pub async fn reload(&self) -> Result<ReloadResponse, ClientError> {
        let url = format!("{}/catalog/reload", self.base_url);
        let response = self.http.post(&url).headers(self.headers()).send().await?;
        self.parse(response).await
    }
}
