//! JSON envelopes shared by the dashboard endpoints.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// List payload for row-shaped endpoints. A failed fetch keeps `rows`
/// empty and sets `error`, so the front end can always render the
/// collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RowsResponse<T> {
    pub rows: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> RowsResponse<T> {
    pub fn ok(rows: Vec<T>) -> Self {
        Self { rows, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Board payload: items plus the status options resolved from the live
/// schema, so the UI can render its columns and filter dropdowns.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse<T> {
    pub items: Vec<T>,
    pub status_options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> BoardResponse<T> {
    pub fn ok(items: Vec<T>, status_options: Vec<String>) -> Self {
        Self {
            items,
            status_options,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            status_options: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Acknowledgement for mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MutationResponse {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: Some(id.into()),
        }
    }
}

/// Error body for non-list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ErrorResponse {
    pub error: String,
}
