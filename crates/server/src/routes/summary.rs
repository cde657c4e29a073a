//! KPI summary route.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use services::services::dashboard::Summary;

use crate::{AppState, error::ApiError};

/// GET /summary — the four home-page counters, fetched concurrently.
pub async fn summary(
    State(state): State<AppState>,
) -> Result<ResponseJson<Summary>, ApiError> {
    Ok(ResponseJson(state.dashboard.summary().await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(summary))
}
