//! Photo gallery routes. Blobs live in external storage; the dashboard
//! only tracks their URLs.

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    routing::get,
};
use services::services::{mutations::CreatePhoto, row_mapper::Row};
use utils::response::{MutationResponse, RowsResponse};

use crate::{
    AppState,
    error::{ApiError, rows_failure},
    routes::ListParams,
};

/// GET /photos — optionally filtered by project relation.
pub async fn list_photos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let query = params.into_query();
    match state
        .dashboard
        .list_rows(&state.databases.photos, &query)
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            ResponseJson(RowsResponse::ok(rows.as_ref().clone())),
        ),
        Err(e) => rows_failure::<Row>(e),
    }
}

/// POST /photos — register an uploaded photo by URL.
pub async fn create_photo(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreatePhoto>,
) -> Result<ResponseJson<MutationResponse>, ApiError> {
    if payload.url.trim().is_empty() {
        return Err(ApiError::BadRequest("url must not be empty".to_string()));
    }

    let id = state
        .mutations
        .create_photo(&state.databases.photos, &payload)
        .await?;
    Ok(ResponseJson(MutationResponse::ok(id)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/photos", get(list_photos).post(create_photo))
}
