//! Maps service errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use notion::NotionApiError;
use services::services::{
    dashboard::DashboardError, mutations::MutationError, schema_resolver::SchemaError,
};
use thiserror::Error;
use utils::response::{BoardResponse, ErrorResponse, RowsResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    /// Client-caused problems map to 4xx; remote and schema failures to
    /// 5xx.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Mutation(MutationError::FieldNotSupported { .. })
            | ApiError::Mutation(MutationError::IncompatibleValue { .. })
            | ApiError::Mutation(MutationError::NoParentDatabase(_)) => StatusCode::BAD_REQUEST,
            ApiError::Mutation(MutationError::Api(e))
            | ApiError::Mutation(MutationError::Schema(SchemaError::Api(e)))
            | ApiError::Dashboard(DashboardError::Api(e))
            | ApiError::Dashboard(DashboardError::Schema(SchemaError::Api(e))) => remote_status(e),
            ApiError::Mutation(MutationError::Schema(_))
            | ApiError::Dashboard(DashboardError::Schema(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn remote_status(error: &NotionApiError) -> StatusCode {
    match error {
        NotionApiError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = %status, error = %self, "request failed");
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// List endpoints degrade to an empty collection plus the error text so
/// the board still renders.
pub fn rows_failure<T>(error: impl Into<ApiError>) -> (StatusCode, Json<RowsResponse<T>>) {
    let error = error.into();
    tracing::error!(status = %error.status(), error = %error, "list fetch failed");
    (error.status(), Json(RowsResponse::failure(error.to_string())))
}

/// Board variant of [`rows_failure`].
pub fn board_failure<T>(error: impl Into<ApiError>) -> (StatusCode, Json<BoardResponse<T>>) {
    let error = error.into();
    tracing::error!(status = %error.status(), error = %error, "board fetch failed");
    (
        error.status(),
        Json(BoardResponse::failure(error.to_string())),
    )
}
