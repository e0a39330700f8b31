use axum::{routing::get, Router};

use super::handlers::{
    create_grooming, delete_grooming, get_grooming, list_groomings, search_groomings,
    update_grooming,
};
use crate::app_state::AppState;

pub fn grooming_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groomings).post(create_grooming))
        .route("/search", get(search_groomings))
        .route(
            "/{id}",
            get(get_grooming).put(update_grooming).delete(delete_grooming),
        )
}
