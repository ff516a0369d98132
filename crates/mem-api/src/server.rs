//! Axum server and routes.

use crate::docs;
use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use mem_types::{
    CreateMemoryRequest, CreateMemoryResponse, HealthResponse, MemoryListQuery,
    MemoryListResponse, MemoryRecord, MemoryStore,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use uuid::Uuid;

pub const SERVICE_NAME: &str = "memory-management-api";

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

pub struct AppState {
    pub store: Arc<dyn MemoryStore + Send + Sync>,
    /// Bearer key required on record routes; `None` leaves them open.
    pub api_key: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let records = Router::new()
        .route("/memory", post(handle_create))
        .route("/memory/user/:user_id", get(handle_list))
        .route(
            "/memory/:memory_id",
            get(handle_get).delete(handle_delete),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_bearer,
        ));

    Router::new()
        .route("/memory/health", get(handle_health))
        .route("/memory/docs", get(docs::handle_docs))
        .route("/memory/openapi.json", get(docs::handle_openapi))
        .merge(records)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(ref expected) = state.api_key else {
        return Ok(next.run(request).await);
    };
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim());
    match token {
        None => return Err(ApiError::Unauthorized("Missing bearer token")),
        Some(t) if t != expected.as_str() => {
            return Err(ApiError::Unauthorized("Invalid API key"));
        }
        Some(_) => {}
    }
    Ok(next.run(request).await)
}

async fn handle_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let memory_count = state.store.count().await?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        memory_count,
    }))
}

async fn handle_create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateMemoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateMemoryResponse>), ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::Rejected {
        status: rejection.status(),
        detail: rejection.body_text(),
    })?;
    req.validate()?;

    let memory_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let record = MemoryRecord::from_request(memory_id.clone(), req, now.clone());
    let (user_id, persona_id) = (record.user_id.clone(), record.persona_id.clone());
    state.store.insert(record).await?;
    tracing::info!(
        memory_id = %memory_id,
        user_id = %user_id,
        persona_id = %persona_id,
        "memory created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateMemoryResponse {
            memory_id,
            status: "created".to_string(),
            created_at: now,
        }),
    ))
}

async fn handle_get(
    State(state): State<Arc<AppState>>,
    Path(memory_id): Path<String>,
) -> Result<Json<MemoryRecord>, ApiError> {
    match state.store.get(&memory_id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(memory_id)),
    }
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path(memory_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete(&memory_id).await? {
        tracing::info!(memory_id = %memory_id, "memory deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(memory_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub persona_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

async fn handle_list(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(q): Query<ListQuery>,
) -> Result<Json<MemoryListResponse>, ApiError> {
    let query = MemoryListQuery {
        user_id,
        persona_id: q.persona_id.filter(|p| !p.is_empty()),
        limit: q.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT),
        offset: q.offset.unwrap_or(0),
    };
    let (memories, total) = state.store.list(&query).await?;
    Ok(Json(MemoryListResponse {
        memories,
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}
