//! Problem/improvement tracker routes.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    routing::{get, patch},
};
use serde::Deserialize;
use services::services::{
    dashboard,
    mutations::FieldValue,
    row_mapper::Row,
    schema_resolver::LogicalField,
};
use ts_rs::TS;
use utils::response::{BoardResponse, MutationResponse};

use crate::{
    AppState,
    error::{ApiError, board_failure},
    routes::ListParams,
};

/// GET /improvements — optionally narrowed to records still open.
pub async fn list_improvements(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let database = state.databases.improvements.clone();
    let open_only = params.open.unwrap_or(false);
    let query = params.into_query();

    let rows = state.dashboard.list_rows(&database, &query).await;
    let options = state.dashboard.status_options(&database).await;

    match (rows, options) {
        (Ok(rows), Ok(status_options)) => {
            let mut items = rows.as_ref().clone();
            if open_only {
                items.retain(dashboard::is_open);
            }
            (
                StatusCode::OK,
                ResponseJson(BoardResponse::ok(items, status_options)),
            )
        }
        (Err(e), _) => board_failure::<Row>(e),
        (_, Err(e)) => board_failure::<Row>(e),
    }
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateImprovement {
    pub status: String,
}

/// PATCH /improvements/{id} — status change.
pub async fn update_improvement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<UpdateImprovement>,
) -> Result<ResponseJson<MutationResponse>, ApiError> {
    state
        .mutations
        .set_field(&id, LogicalField::Status, FieldValue::Status(payload.status))
        .await?;
    Ok(ResponseJson(MutationResponse::ok(id)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/improvements", get(list_improvements))
        .route("/improvements/{id}", patch(update_improvement))
}
