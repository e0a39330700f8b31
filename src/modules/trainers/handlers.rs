use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::db::{NewTrainer, Trainer, UpdateTrainer};
use crate::error::AppResult;
use crate::extract::{RecordId, ValidatedJson};

/// Register a new trainer
pub async fn create_trainer(
    State(state): State<AppState>,
    ValidatedJson(new_trainer): ValidatedJson<NewTrainer>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let trainer = state.trainers.create(&new_trainer).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "Trainer added successfully", "trainer": trainer })),
    ))
}

/// List all trainers with their session history
pub async fn list_trainers(State(state): State<AppState>) -> AppResult<Json<Vec<Trainer>>> {
    Ok(Json(state.trainers.list().await?))
}

pub async fn get_trainer(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<Trainer>> {
    Ok(Json(state.trainers.get(id).await?))
}

pub async fn update_trainer(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidatedJson(update): ValidatedJson<UpdateTrainer>,
) -> AppResult<Json<Value>> {
    let trainer = state.trainers.update(id, &update).await?;
    Ok(Json(json!({ "msg": "Trainer updated successfully", "trainer": trainer })))
}

pub async fn delete_trainer(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<Value>> {
    state.trainers.delete(id).await?;
    Ok(Json(json!({ "msg": "Trainer deleted successfully" })))
}
