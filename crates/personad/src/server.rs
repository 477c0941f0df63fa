//! HTTP API server for personad.
//!
//! Local-only REST API over the workspace catalogs. Every endpoint except
//! `/health` requires the bearer token when one is configured.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use persona_core::activation::{activate, Activation, ActivationRequest};
use persona_core::agents::AgentProfile;
use persona_core::catalog::{Catalog, CatalogError, DiscoveryError};
use persona_core::detection::{detect_complexity, ComplexityReport};
use persona_core::skills::{extract_body, parse_steps, SkillMetadata, WorkflowStep};
use persona_core::{analyze_skill_and_activate_agents, Config, OrchestrationResult};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::ConfigSource;

/// Shared state for HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    pub source: ConfigSource,
    pub routing: RwLock<Routing>,
    pub auth_token: Option<String>,
}

/// Config and the catalog scanned with it. Swapped as one unit on reload.
#[derive(Debug)]
pub struct Routing {
    pub config: Config,
    pub catalog: Catalog,
}

impl Routing {
    /// Scan the catalog directories named in `config`.
    pub fn load(config: Config) -> Self {
        let catalog = Catalog::load(&config);
        Self { config, catalog }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Create the HTTP router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/activate", post(activate_agents))
        .route("/detect", post(detect))
        .route("/skills", get(list_skills))
        .route("/skills/{name}", get(get_skill))
        .route("/agents", get(list_agents))
        .route("/agents/{name}", get(get_agent))
        .route("/catalog/reload", post(reload_catalog))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and serve until `shutdown` is cancelled.
pub async fn start_server(
    state: Arc<AppState>,
    port: u16,
    shutdown: CancellationToken,
) -> eyre::Result<()> {
    let router = create_router(state);

    // Local-only: bind to 127.0.0.1
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Validate auth token if configured.
fn check_auth(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if let Some(expected) = &state.auth_token {
        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.strip_prefix("Bearer ").unwrap_or(s));

        match provided {
            Some(token) if token == expected => Ok(()),
            Some(_) => Err(api_error(StatusCode::UNAUTHORIZED, "invalid auth token")),
            None => Err(api_error(StatusCode::UNAUTHORIZED, "missing auth token")),
        }
    } else {
        Ok(())
    }
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn catalog_error(err: &CatalogError) -> ApiError {
    match err {
        CatalogError::AgentNotFound { .. } | CatalogError::SkillNotFound(_) => {
            warn!("{}", err);
            api_error(StatusCode::NOT_FOUND, err.to_string())
        }
        _ => {
            error!("{}", err);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

/// Resolve the skill document a request refers to, by content or by name.
fn skill_content(
    catalog: &Catalog,
    content: Option<String>,
    name: Option<&str>,
) -> Result<Option<String>, ApiError> {
    match (content, name) {
        (Some(_), Some(_)) => Err(api_error(
            StatusCode::BAD_REQUEST,
            "provide either skill or skill_content, not both",
        )),
        (Some(content), None) => Ok(Some(content)),
        (None, Some(name)) => catalog
            .skill_document(name)
            .map(Some)
            .map_err(|e| catalog_error(&e)),
        (None, None) => Ok(None),
    }
}

// --- Request/Response types ---

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request payload for POST /analyze.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub user_message: String,
    /// Raw SKILL.md content.
    #[serde(default)]
    pub skill_content: Option<String>,
    /// Name of a catalog skill to analyze instead of raw content.
    #[serde(default)]
    pub skill: Option<String>,
}

/// Request payload for POST /activate.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub user_message: String,
    #[serde(default)]
    pub force_agents: Vec<String>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub skill_content: Option<String>,
}

/// Response for POST /activate.
#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub activation: Activation,
}

/// Request payload for POST /detect.
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub message: String,
    /// Overrides the configured complexity threshold.
    #[serde(default)]
    pub threshold: Option<u32>,
}

/// Response for GET /skills.
#[derive(Debug, Serialize)]
pub struct ListSkillsResponse {
    pub skills: Vec<SkillMetadata>,
    pub errors: Vec<DiscoveryError>,
}

/// Response for GET /skills/{name}.
#[derive(Debug, Serialize)]
pub struct GetSkillResponse {
    pub skill: SkillMetadata,
    pub body: String,
    pub steps: Vec<WorkflowStep>,
}

/// Response for GET /agents.
#[derive(Debug, Serialize)]
pub struct ListAgentsResponse {
    pub agents: Vec<AgentProfile>,
    pub errors: Vec<DiscoveryError>,
}

/// Response for GET /agents/{name}.
#[derive(Debug, Serialize)]
pub struct GetAgentResponse {
    pub name: String,
    /// Raw persona markdown.
    pub document: String,
}

/// Response for POST /catalog/reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub agents: usize,
    pub skills: usize,
    pub errors: Vec<DiscoveryError>,
}

// --- Handlers ---

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /analyze - Run skill orchestration without persona rendering.
async fn analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<OrchestrationResult>, ApiError> {
    check_auth(&state, &headers)?;

    let routing = state.routing.read().await;
    let content = skill_content(&routing.catalog, req.skill_content, req.skill.as_deref())?;

    let result = analyze_skill_and_activate_agents(
        content.as_deref(),
        &req.user_message,
        &routing.catalog.scoring_agents(),
        &routing.config.scoring_policy(),
    );
    Ok(Json(result))
}

/// POST /activate - Choose agents for a request and render their personas.
async fn activate_agents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<ActivateResponse>, ApiError> {
    check_auth(&state, &headers)?;

    let routing = state.routing.read().await;
    let content = skill_content(&routing.catalog, req.skill_content, req.skill.as_deref())?;

    let request = ActivationRequest {
        user_message: req.user_message,
        force_agents: req.force_agents,
        skill_content: content,
    };
    let activation = activate(&request, &routing.catalog.agents, &routing.config);
    let verbose = routing.config.verbose;
    drop(routing);
    let request_id = Uuid::now_v7();

    if verbose {
        info!(
            %request_id,
            timestamp = %Utc::now().to_rfc3339(),
            message = %request.user_message,
            strategy = activation.strategy.as_str(),
            agents = ?activation.activated_agents,
            "activated agents"
        );
    }
    for err in &activation.errors {
        warn!(%request_id, "{}", err);
    }

    Ok(Json(ActivateResponse {
        request_id,
        activation,
    }))
}

/// POST /detect - Score request complexity.
async fn detect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<DetectRequest>,
) -> Result<Json<ComplexityReport>, ApiError> {
    check_auth(&state, &headers)?;

    let threshold = match req.threshold {
        Some(threshold) => threshold,
        None => state.routing.read().await.config.complexity_threshold,
    };
    Ok(Json(detect_complexity(&req.message, threshold)))
}

/// GET /skills - List discovered skills.
async fn list_skills(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ListSkillsResponse>, ApiError> {
    check_auth(&state, &headers)?;

    let routing = state.routing.read().await;
    Ok(Json(ListSkillsResponse {
        skills: routing.catalog.skills.clone(),
        errors: routing.catalog.errors.clone(),
    }))
}

/// GET /skills/{name} - Skill metadata with its workflow steps.
async fn get_skill(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<GetSkillResponse>, ApiError> {
    check_auth(&state, &headers)?;

    let routing = state.routing.read().await;
    let catalog = &routing.catalog;
    let skill = catalog
        .skill(&name)
        .cloned()
        .ok_or_else(|| catalog_error(&CatalogError::SkillNotFound(name.clone())))?;
    let content = catalog.skill_document(&name).map_err(|e| catalog_error(&e))?;
    let body = extract_body(&content)
        .map_err(|e| {
            api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("invalid skill {name}: {e}"),
            )
        })?
        .to_string();
    let steps = parse_steps(&body);

    Ok(Json(GetSkillResponse { skill, body, steps }))
}

/// GET /agents - List discovered agents.
async fn list_agents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ListAgentsResponse>, ApiError> {
    check_auth(&state, &headers)?;

    let routing = state.routing.read().await;
    Ok(Json(ListAgentsResponse {
        agents: routing.catalog.agents.clone(),
        errors: routing.catalog.errors.clone(),
    }))
}

/// GET /agents/{name} - Raw persona document.
async fn get_agent(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<GetAgentResponse>, ApiError> {
    check_auth(&state, &headers)?;

    let document = state
        .routing
        .read()
        .await
        .catalog
        .agent_document(&name)
        .map_err(|e| catalog_error(&e))?;

    Ok(Json(GetAgentResponse { name, document }))
}

/// POST /catalog/reload - Re-read config and rescan catalog directories.
async fn reload_catalog(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ReloadResponse>, ApiError> {
    check_auth(&state, &headers)?;

    let config = state.source.load().map_err(|e| {
        error!("config reload failed: {:#}", e);
        api_error(StatusCode::UNPROCESSABLE_ENTITY, format!("{e:#}"))
    })?;
    let routing = Routing::load(config);

    let response = ReloadResponse {
        agents: routing.catalog.agents.len(),
        skills: routing.catalog.skills.len(),
        errors: routing.catalog.errors.clone(),
    };
    info!(
        agents = response.agents,
        skills = response.skills,
        errors = response.errors.len(),
        "catalog reloaded"
    );

    *state.routing.write().await = routing;

    Ok(Json(response))
}
