//! Site note / comment routes.

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    routing::get,
};
use services::services::{mutations::CreateNote, row_mapper::Row};
use utils::response::{MutationResponse, RowsResponse};

use crate::{
    AppState,
    error::{ApiError, rows_failure},
    routes::ListParams,
};

/// GET /notes — optionally filtered by project relation.
pub async fn list_notes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let query = params.into_query();
    match state
        .dashboard
        .list_rows(&state.databases.notes, &query)
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            ResponseJson(RowsResponse::ok(rows.as_ref().clone())),
        ),
        Err(e) => rows_failure::<Row>(e),
    }
}

/// POST /notes — record a note against a project.
pub async fn create_note(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateNote>,
) -> Result<ResponseJson<MutationResponse>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let id = state
        .mutations
        .create_note(&state.databases.notes, &payload)
        .await?;
    Ok(ResponseJson(MutationResponse::ok(id)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/notes", get(list_notes).post(create_note))
}
