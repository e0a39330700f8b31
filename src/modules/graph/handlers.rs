use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use time::OffsetDateTime;

use super::GroomingReport;
use crate::app_state::AppState;
use crate::db::dates;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_bound(name: &str, value: Option<&str>) -> AppResult<Option<OffsetDateTime>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => dates::parse(raw)
            .map(Some)
            .map_err(|err| AppError::Validation(format!("Invalid {name} '{raw}': {err}"))),
        None => Ok(None),
    }
}

/// Overall stats, month-wise aggregation and the matching sessions
pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<GroomingReport>> {
    let start = parse_bound("startDate", query.start_date.as_deref())?;
    let end = parse_bound("endDate", query.end_date.as_deref())?;
    Ok(Json(state.reports.compute(start, end).await?))
}
