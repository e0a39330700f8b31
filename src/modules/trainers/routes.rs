use axum::{routing::get, Router};

use super::handlers::{create_trainer, delete_trainer, get_trainer, list_trainers, update_trainer};
use crate::app_state::AppState;

pub fn trainer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trainers).post(create_trainer))
        .route(
            "/{id}",
            get(get_trainer).put(update_trainer).delete(delete_trainer),
        )
}
