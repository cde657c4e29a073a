//! Operational diagnosis of the configured remote databases. Reports what
//! each database's live schema actually contains so column renames can be
//! spotted without digging through request logs.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use futures::future::join_all;
use serde::Serialize;
use ts_rs::TS;

use crate::AppState;

/// Health report for one configured database.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub name: &'static str,
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, TS)]
pub struct HealthResponse {
    pub databases: Vec<DatabaseHealth>,
}

/// GET /health — never fails as a whole; each database reports its own
/// retrieval outcome.
pub async fn health(State(state): State<AppState>) -> ResponseJson<HealthResponse> {
    let targets = [
        ("projects", state.databases.projects.clone()),
        ("improvements", state.databases.improvements.clone()),
        ("notes", state.databases.notes.clone()),
        ("tasks", state.databases.tasks.clone()),
        ("photos", state.databases.photos.clone()),
    ];

    let checks = targets.into_iter().map(|(name, id)| {
        let notion = state.notion.clone();
        async move {
            match notion.retrieve_database(&id).await {
                Ok(db) => {
                    let mut columns: Vec<String> = db.properties.keys().cloned().collect();
                    columns.sort();
                    DatabaseHealth {
                        name,
                        id,
                        ok: true,
                        title: Some(db.title_text()),
                        columns,
                        error: None,
                    }
                }
                Err(e) => DatabaseHealth {
                    name,
                    id,
                    ok: false,
                    title: None,
                    columns: Vec::new(),
                    error: Some(e.to_string()),
                },
            }
        }
    });

    ResponseJson(HealthResponse {
        databases: join_all(checks).await,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
