use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::db::{GroomingInput, PopulatedGrooming};
use crate::error::AppResult;
use crate::extract::{RecordId, ValidatedJson};

/// Add a grooming session and record it in the trainers' histories
pub async fn create_grooming(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<GroomingInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let grooming = state.groomings.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "Grooming session added successfully", "grooming": grooming })),
    ))
}

pub async fn list_groomings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PopulatedGrooming>>> {
    Ok(Json(state.groomings.list().await?))
}

pub async fn search_groomings(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> AppResult<Json<Vec<PopulatedGrooming>>> {
    Ok(Json(state.groomings.search(&params).await?))
}

pub async fn get_grooming(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<PopulatedGrooming>> {
    Ok(Json(state.groomings.get(id).await?))
}

/// Replace a grooming session and re-sync trainer histories
pub async fn update_grooming(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidatedJson(input): ValidatedJson<GroomingInput>,
) -> AppResult<Json<Value>> {
    let grooming = state.groomings.update(id, input).await?;
    Ok(Json(json!({
        "msg": "Grooming session updated successfully and trainers synced",
        "grooming": grooming,
    })))
}

pub async fn delete_grooming(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<Value>> {
    let grooming = state.groomings.delete(id).await?;
    Ok(Json(json!({ "msg": "Grooming session deleted successfully", "grooming": grooming })))
}
