//! HTTP routes: tool generation, manifest listing and health
//!
//! `POST /tldraw-tool` runs the whole pipeline for one query: generate, parse,
//! persist. Fatal failures produce an error body and no artifact. A partially
//! persisted tool is still returned with 200, and the slots that failed are
//! listed in the `x-toolgen-persist-failed` header.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use toolgen_api_gateway::TOOL_SYSTEM_PROMPT;
use toolgen_forge::{parse_tool_output, PersistReport, ToolArtifact, ToolManifest};

use crate::error::{AppError, AppResult};
use crate::AppState;

pub const PERSIST_FAILED_HEADER: &str = "x-toolgen-persist-failed";

/// Build the router with CORS restricted to `allowed_origins`.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/tldraw-tool", post(generate_tool_handler))
        .route("/tldraw-tools", get(list_tools))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(PERSIST_FAILED_HEADER)])
}

// --- API Types ---

#[derive(Deserialize)]
struct GenerateToolRequest {
    query: String,
}

#[derive(Serialize)]
struct HealthResponse {
    healthy: bool,
    version: String,
}

// --- Handlers ---

async fn generate_tool_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateToolRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if request.query.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be empty".into()));
    }

    let request_id = Uuid::new_v4();
    let (artifact, report) = generate_tool(&state, &request.query)
        .instrument(tracing::info_span!("generate_tool", %request_id))
        .await?;

    let mut response = Json(artifact).into_response();
    let failed = report.failed();
    if !failed.is_empty() {
        let slots = failed
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&slots) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(PERSIST_FAILED_HEADER), value);
        }
    }
    Ok(response)
}

/// Generate, parse and persist one tool.
pub async fn generate_tool(
    state: &AppState,
    query: &str,
) -> AppResult<(ToolArtifact, PersistReport)> {
    info!("Generating tool for query: {query}");

    let raw = state.generator.generate(TOOL_SYSTEM_PROMPT, query).await.map_err(|e| {
        error!("Error generating tool: {e}");
        AppError::from(e)
    })?;

    let artifact = parse_tool_output(&raw).map_err(|e| {
        error!("Error parsing tool output: {e}\n--- raw output ---\n{raw}");
        AppError::from(e)
    })?;

    let report = state.persister.persist(&artifact).await.map_err(|e| {
        error!("Error persisting tool {}: {e}", artifact.id);
        AppError::from(e)
    })?;

    if report.ok() {
        info!("Generated tool {}", artifact.id);
    } else {
        warn!(
            "Generated tool {} with {} persistence error(s)",
            artifact.id,
            report.errors().len()
        );
    }
    Ok((artifact, report))
}

async fn list_tools(State(state): State<AppState>) -> AppResult<Json<ToolManifest>> {
    let manifest = state.persister.manifest().list().await?;
    Ok(Json(manifest))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").into(),
    })
}
