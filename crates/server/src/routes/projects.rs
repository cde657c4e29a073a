//! Project status board routes.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    routing::{get, patch},
};
use serde::Deserialize;
use services::services::{
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

/// GET /projects — the status board.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let database = state.databases.projects.clone();
    let query = params.into_query();

    let rows = state.dashboard.list_rows(&database, &query).await;
    let options = state.dashboard.status_options(&database).await;

    match (rows, options) {
        (Ok(rows), Ok(status_options)) => (
            StatusCode::OK,
            ResponseJson(BoardResponse::ok(rows.as_ref().clone(), status_options)),
        ),
        (Err(e), _) => board_failure::<Row>(e),
        (_, Err(e)) => board_failure::<Row>(e),
    }
}

/// Fields accepted by a project update.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    pub status: Option<String>,
    pub job_account: Option<bool>,
    pub follow_up: Option<bool>,
}

/// PATCH /projects/{id} — single-field updates on a project record.
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<UpdateProject>,
) -> Result<ResponseJson<MutationResponse>, ApiError> {
    let mut changes: Vec<(LogicalField, FieldValue)> = Vec::new();
    if let Some(status) = payload.status {
        changes.push((LogicalField::Status, FieldValue::Status(status)));
    }
    if let Some(flag) = payload.job_account {
        changes.push((LogicalField::JobAccount, FieldValue::Checkbox(flag)));
    }
    if let Some(flag) = payload.follow_up {
        changes.push((LogicalField::FollowUp, FieldValue::Checkbox(flag)));
    }

    if changes.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_string()));
    }

    for (field, value) in changes {
        state.mutations.set_field(&id, field, value).await?;
    }

    Ok(ResponseJson(MutationResponse::ok(id)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/{id}", patch(update_project))
}
