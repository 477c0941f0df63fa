//! Integration tests for the HTTP API.
//!
//! Builds a workspace with agent and skill fixtures on disk and drives the
//! router end to end: orchestration, activation, catalog browsing, reload.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use personad::server::{create_router, AppState, Routing};
use personad::{ConfigOverrides, ConfigSource};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;

const SECURITY_AGENT: &str = "---
name: security-engineer
expertise: [Authentication, Cryptography, Threat modelling]
activation_keywords: [security, auth, encryption]
principles:
  - Defense in depth
---
You are a security engineer.
";

const DATABASE_AGENT: &str = "---
name: database-specialist
expertise: [Query planning, Indexing]
activation_keywords: [database, sql, query]
---
You are a database specialist.
";

const FRONTEND_AGENT: &str = "---
name: frontend-architect
expertise: [React, CSS]
activation_keywords: [react, css, component]
---
";

const LOGIN_SKILL: &str = "---
name: secure-login
description: Build a login flow that stores credentials safely.
---

# Secure Login

This skill requires security expertise for credential handling.
Consider the database schema for users.

### Design the flow
- password storage → security-engineer
- user lookup queries → database-specialist

### Implement
Write the handlers.
";

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn create_workspace(extra_config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join(".persona/config"),
        &format!("custom_agents_dir=\ncustom_skills_dir=\n{extra_config}"),
    );
    write(&root.join("agents/security-engineer.md"), SECURITY_AGENT);
    write(&root.join("agents/database-specialist.md"), DATABASE_AGENT);
    write(&root.join("agents/frontend-architect.md"), FRONTEND_AGENT);
    write(&root.join("skills/secure-login/SKILL.md"), LOGIN_SKILL);
    dir
}

fn create_test_app(workspace: &TempDir) -> (axum::Router, Arc<AppState>) {
    let source = ConfigSource {
        workspace_root: workspace.path().to_path_buf(),
        config_path: None,
        overrides: ConfigOverrides::default(),
    };
    let routing = Routing::load(source.load().unwrap());
    let state = Arc::new(AppState {
        source,
        routing: RwLock::new(routing),
        auth_token: None,
    });

    (create_router(Arc::clone(&state)), state)
}

async fn body_to_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: &axum::Router, uri: &str, body: &Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &axum::Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

// --- Orchestration ---

#[tokio::test]
async fn analyze_named_skill_scores_agents() {
    let workspace = create_workspace("");
    let (app, _) = create_test_app(&workspace);

    let body = serde_json::json!({
        "skill": "secure-login",
        "user_message": "Add password storage to the signup page"
    });
    let response = post_json(&app, "/analyze", &body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    // direct hint (10) + "password storage" rule (20)
    assert_eq!(json["scores"]["security-engineer"], 30);
    // subtle hint "the database schema for users" (5)
    assert_eq!(json["scores"]["database-specialist"], 5);
    assert_eq!(json["scores"]["frontend-architect"], 0);
    assert_eq!(json["activated_agents"], serde_json::json!(["security-engineer"]));
    assert_eq!(json["hints"]["direct"], serde_json::json!(["security"]));
    assert_eq!(json["conditionals"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn analyze_raw_content_without_skill() {
    let workspace = create_workspace("");
    let (app, _) = create_test_app(&workspace);

    let body = serde_json::json!({
        "skill_content": "- slow query plans → database-specialist",
        "user_message": "this query is slow"
    });
    let json = body_to_json(post_json(&app, "/analyze", &body).await).await;
    assert_eq!(json["activated_agents"], serde_json::json!(["database-specialist"]));

    let body = serde_json::json!({ "user_message": "this query is slow" });
    let json = body_to_json(post_json(&app, "/analyze", &body).await).await;
    assert_eq!(json["activated_agents"], serde_json::json!([]));
}

// --- Activation ---

#[tokio::test]
async fn activate_with_skill_renders_personas() {
    let workspace = create_workspace("");
    let (app, _) = create_test_app(&workspace);

    let body = serde_json::json!({
        "skill": "secure-login",
        "user_message": "Add password storage to the signup page"
    });
    let response = post_json(&app, "/activate", &body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert!(json["request_id"].as_str().is_some());
    assert_eq!(json["strategy"], "orchestrated");
    assert_eq!(json["activated_agents"], serde_json::json!(["security-engineer"]));
    let personas = json["personas"].as_str().unwrap();
    assert!(personas.contains("## Security Engineer"));
    assert!(personas.contains("- Defense in depth"));
    assert!(json["orchestration"]["scores"].is_object());
}

#[tokio::test]
async fn activate_falls_back_to_keywords() {
    let workspace = create_workspace("");
    let (app, _) = create_test_app(&workspace);

    let body = serde_json::json!({ "user_message": "The React component re-renders too often" });
    let json = body_to_json(post_json(&app, "/activate", &body).await).await;

    assert_eq!(json["strategy"], "keyword_fallback");
    assert_eq!(json["activated_agents"], serde_json::json!(["frontend-architect"]));
}

#[tokio::test]
async fn activate_forced_agents_reports_unknown() {
    let workspace = create_workspace("");
    let (app, _) = create_test_app(&workspace);

    let body = serde_json::json!({
        "user_message": "anything",
        "force_agents": ["database-specialist", "ghost"]
    });
    let json = body_to_json(post_json(&app, "/activate", &body).await).await;

    assert_eq!(json["strategy"], "forced");
    assert_eq!(
        json["activated_agents"],
        serde_json::json!(["database-specialist", "ghost"])
    );
    assert_eq!(json["errors"], serde_json::json!(["unknown agent: ghost"]));
    assert!(json.get("orchestration").is_none());
}

#[tokio::test]
async fn activate_respects_configured_cap_and_detail() {
    let workspace = create_workspace("max_agents_per_request=1\npersona_detail=minimal\n");
    let (app, _) = create_test_app(&workspace);

    let body = serde_json::json!({ "user_message": "security review of the sql layer" });
    let json = body_to_json(post_json(&app, "/activate", &body).await).await;

    // catalog order: database-specialist sorts first
    assert_eq!(json["activated_agents"], serde_json::json!(["database-specialist"]));
    let personas = json["personas"].as_str().unwrap();
    assert!(personas.contains("Expertise: Query planning, Indexing"));
    assert!(!personas.contains("Security Engineer"));
}

// --- Detection ---

#[tokio::test]
async fn detect_uses_configured_threshold() {
    let workspace = create_workspace("complexity_threshold=5\n");
    let (app, _) = create_test_app(&workspace);

    let body = serde_json::json!({ "message": "Tune the SQL database" });
    let json = body_to_json(post_json(&app, "/detect", &body).await).await;
    assert_eq!(json["score"], 2);
    assert_eq!(json["is_complex"], false);

    let body = serde_json::json!({ "message": "Tune the SQL database", "threshold": 2 });
    let json = body_to_json(post_json(&app, "/detect", &body).await).await;
    assert_eq!(json["is_complex"], true);
}

// --- Catalog ---

#[tokio::test]
async fn list_and_get_skills() {
    let workspace = create_workspace("");
    let (app, _) = create_test_app(&workspace);

    let json = body_to_json(get(&app, "/skills").await).await;
    assert_eq!(json["skills"][0]["name"], "secure-login");
    assert_eq!(json["skills"][0]["source"], "built_in");

    let response = get(&app, "/skills/secure-login").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["skill"]["name"], "secure-login");
    assert!(json["body"].as_str().unwrap().starts_with("# Secure Login"));
    assert_eq!(json["steps"][0]["name"], "Design the flow");
    assert_eq!(json["steps"][1]["name"], "Implement");
    assert_eq!(json["steps"][1]["context"], serde_json::json!(["Write the handlers."]));

    assert_eq!(get(&app, "/skills/missing").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_and_get_agents() {
    let workspace = create_workspace("");
    let (app, _) = create_test_app(&workspace);

    let json = body_to_json(get(&app, "/agents").await).await;
    let names: Vec<_> = json["agents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["database-specialist", "frontend-architect", "security-engineer"]
    );

    let json = body_to_json(get(&app, "/agents/security-engineer").await).await;
    assert_eq!(json["name"], "security-engineer");
    assert!(json["document"]
        .as_str()
        .unwrap()
        .contains("You are a security engineer."));
}

#[tokio::test]
async fn unknown_agent_lists_searched_dirs() {
    let workspace = create_workspace("");
    let (app, _state) = create_test_app(&workspace);

    let response = get(&app, "/agents/ghost").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("agent not found: ghost"));
    assert!(error.contains("Searched in:"));
    let agents_dir = workspace.path().join("agents");
    assert!(error.contains(&format!("- {}", agents_dir.display())));
}

#[tokio::test]
async fn reload_picks_up_new_agents_and_config() {
    let workspace = create_workspace("");
    let (app, state) = create_test_app(&workspace);

    write(
        &workspace.path().join("agents/performance-engineer.md"),
        "---\nname: performance-engineer\nactivation_keywords: [latency]\n---\n",
    );
    write(&workspace.path().join("agents/Broken Name.md"), "---\nname: Broken Name\n---\n");
    write(
        &workspace.path().join(".persona/config"),
        "custom_agents_dir=\ncustom_skills_dir=\nactivation_threshold=40\n",
    );

    let response = post_json(&app, "/catalog/reload", &serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["agents"], 4);
    assert_eq!(json["skills"], 1);
    assert_eq!(json["errors"].as_array().unwrap().len(), 1);

    {
        let routing = state.routing.read().await;
        assert_eq!(routing.config.activation_threshold, 40);
        assert!(routing.catalog.agent("performance-engineer").is_some());
    }

    // 30 no longer clears the raised threshold
    let body = serde_json::json!({
        "skill": "secure-login",
        "user_message": "Add password storage to the signup page"
    });
    let json = body_to_json(post_json(&app, "/analyze", &body).await).await;
    assert_eq!(json["activated_agents"], serde_json::json!([]));
}

#[tokio::test]
async fn reload_with_broken_config_keeps_previous_state() {
    let workspace = create_workspace("");
    let (app, state) = create_test_app(&workspace);

    write(&workspace.path().join(".persona/config"), "verbose=sometimes\n");

    let response = post_json(&app, "/catalog/reload", &serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let routing = state.routing.read().await;
    assert_eq!(routing.catalog.agents.len(), 3);
    assert_eq!(routing.config.activation_threshold, 8);
}
