//! Task list routes.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use services::services::{
    mutations::{CreateTask, FieldValue},
    row_mapper::Row,
    schema_resolver::LogicalField,
};
use ts_rs::TS;
use utils::response::{MutationResponse, RowsResponse};

use crate::{
    AppState,
    error::{ApiError, rows_failure},
    routes::ListParams,
};

/// GET /tasks — optionally filtered by project relation.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let query = params.into_query();
    match state
        .dashboard
        .list_rows(&state.databases.tasks, &query)
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            ResponseJson(RowsResponse::ok(rows.as_ref().clone())),
        ),
        Err(e) => rows_failure::<Row>(e),
    }
}

/// POST /tasks — create a task record.
pub async fn create_task(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateTask>,
) -> Result<ResponseJson<MutationResponse>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let id = state
        .mutations
        .create_task(&state.databases.tasks, &payload)
        .await?;
    Ok(ResponseJson(MutationResponse::ok(id)))
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub status: Option<String>,
    pub done: Option<bool>,
}

/// PATCH /tasks/{id} — status or done-flag change.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<UpdateTask>,
) -> Result<ResponseJson<MutationResponse>, ApiError> {
    let mut changes: Vec<(LogicalField, FieldValue)> = Vec::new();
    if let Some(status) = payload.status {
        changes.push((LogicalField::Status, FieldValue::Status(status)));
    }
    if let Some(done) = payload.done {
        changes.push((LogicalField::Done, FieldValue::Checkbox(done)));
    }

    if changes.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_string()));
    }

    for (field, value) in changes {
        state.mutations.set_field(&id, field, value).await?;
    }

    Ok(ResponseJson(MutationResponse::ok(id)))
}

/// Completion acknowledgement, including the fate of the derived note.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskResponse {
    pub ok: bool,
    pub id: String,
    pub followup_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_error: Option<String>,
}

/// POST /tasks/{id}/complete — mark done and record a follow-up note. The
/// note is best effort; its failure is reported but does not fail the
/// completion.
pub async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ResponseJson<CompleteTaskResponse>, ApiError> {
    let outcome = state
        .mutations
        .complete_task(&id, &state.databases.notes)
        .await?;

    Ok(ResponseJson(CompleteTaskResponse {
        ok: true,
        id: outcome.task_id,
        followup_created: outcome.followup_created,
        followup_error: outcome.followup_error,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", patch(update_task))
        .route("/tasks/{id}/complete", post(complete_task))
}
