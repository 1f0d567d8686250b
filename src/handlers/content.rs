use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Collection, ContentRecord};
use crate::state::AppState;

use super::admin::check_auth;

fn parse_collection(name: &str) -> Result<Collection, AppError> {
    Collection::parse(name).ok_or_else(|| AppError::NotFound(format!("collection {name}")))
}

// GET /api/content/:collection — published records only, for the site pages
pub async fn public_list(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<ContentRecord>>, AppError> {
    let collection = parse_collection(&collection)?;

    // visitor-submitted messages are never served publicly
    if collection == Collection::ContactMessages {
        return Err(AppError::NotFound("collection contact_messages".to_string()));
    }

    let records = state.content.select(collection, true).await?;
    Ok(Json(records))
}

// GET /api/admin/content/:collection
pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(collection): Path<String>,
) -> Result<Json<Vec<ContentRecord>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let collection = parse_collection(&collection)?;

    let records = state.content.select(collection, false).await?;
    Ok(Json(records))
}

// POST /api/admin/content/:collection
#[derive(Deserialize)]
pub struct CreateContentRequest {
    pub data: serde_json::Value,
    pub published: Option<bool>,
}

pub async fn admin_create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(collection): Path<String>,
    Json(body): Json<CreateContentRequest>,
) -> Result<Json<ContentRecord>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let collection = parse_collection(&collection)?;

    if !body.data.is_object() {
        return Err(AppError::Validation("data must be a JSON object".to_string()));
    }

    let record = state
        .content
        .insert(collection, body.data, body.published.unwrap_or(false))
        .await?;

    tracing::info!(collection = collection.as_str(), id = %record.id, "created content record");
    Ok(Json(record))
}

// GET /api/admin/content/:collection/:id
pub async fn admin_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<ContentRecord>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let collection = parse_collection(&collection)?;

    let record = state
        .content
        .get(collection, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("record {id}")))?;
    Ok(Json(record))
}

// PUT /api/admin/content/:collection/:id
#[derive(Deserialize)]
pub struct UpdateContentRequest {
    pub data: Option<serde_json::Value>,
    pub published: Option<bool>,
}

pub async fn admin_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<UpdateContentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let collection = parse_collection(&collection)?;

    if let Some(data) = &body.data {
        if !data.is_object() {
            return Err(AppError::Validation("data must be a JSON object".to_string()));
        }
    }

    let updated = state
        .content
        .update(collection, &id, body.data, body.published)
        .await?;

    if updated {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("record {id}")))
    }
}

// DELETE /api/admin/content/:collection/:id
pub async fn admin_delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let collection = parse_collection(&collection)?;

    let deleted = state.content.delete(collection, &id).await?;
    if deleted {
        tracing::info!(collection = collection.as_str(), id = %id, "deleted content record");
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("record {id}")))
    }
}
