//! HTTP request handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;

use lastmile_api_types::{
    DeleteResponse, DeployRequest, DeployResponse, DeploymentList, ErrorBody, HealthResponse,
    LogsResponse, ValidateResponse,
};

use crate::auth::ApiKeyRecord;
use crate::errors::ServerError;
use crate::registry::{DEFAULT_LIMIT, DEFAULT_OFFSET};
use crate::state::ServerState;

/// Health check handler; the only route outside the API-key gate
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// API key validation handler
pub async fn validate_handler(Extension(key): Extension<ApiKeyRecord>) -> impl IntoResponse {
    Json(ValidateResponse {
        valid: true,
        account: key.account,
        tier: key.tier,
    })
}

/// Deployment submission handler
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DeployRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let record = state.registry.create(request)?;

    let response = DeployResponse {
        deployment_id: record.id.clone(),
        project_name: record.project_name.clone(),
        status: record.status,
        message: format!("Deployment queued for {}", record.project_name),
        created_at: record.created_at,
        url: record.url,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Deployment status handler
pub async fn status_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let record = state.registry.get(&id)?;
    Ok(Json(record.detail()))
}

/// Listing query parameters, kept as raw strings so unparseable values
/// normalize to the defaults instead of rejecting the request
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    limit: Option<String>,
    offset: Option<String>,
}

fn parse_or(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .unwrap_or(default)
}

/// Deployment listing handler
pub async fn list_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let limit = parse_or(query.limit.as_deref(), DEFAULT_LIMIT);
    let offset = parse_or(query.offset.as_deref(), DEFAULT_OFFSET);

    let (records, total) = state.registry.list(limit, offset);

    Ok(Json(DeploymentList {
        deployments: records.iter().map(|record| record.detail()).collect(),
        total,
        limit,
        offset,
    }))
}

/// Deployment deletion handler
pub async fn delete_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let deployment_id = state.registry.delete(&id)?;

    Ok(Json(DeleteResponse {
        message: format!("Deployment {} deleted", deployment_id),
        deployment_id,
    }))
}

/// Deployment logs handler
pub async fn logs_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let logs = state.registry.logs(&id)?;

    Ok(Json(LogsResponse {
        deployment_id: id,
        logs,
    }))
}

/// Unmatched route handler
pub async fn not_found_handler(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "not_found".to_string(),
            message: format!("No route for {}", uri.path()),
        }),
    )
}
