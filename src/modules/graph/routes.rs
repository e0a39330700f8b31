use axum::{routing::get, Router};

use super::handlers::get_report;
use crate::app_state::AppState;

pub fn graph_routes() -> Router<AppState> {
    Router::new().route("/", get(get_report))
}
