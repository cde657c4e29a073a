pub mod health;
pub mod improvements;
pub mod notes;
pub mod photos;
pub mod projects;
pub mod summary;
pub mod tasks;

use axum::Router;
use serde::Deserialize;
use services::services::query_builder::RowQuery;

use crate::AppState;

/// Query parameters accepted by the list endpoints. The free-text
/// parameter answers to the names the front end has used over time.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default, alias = "query", alias = "search")]
    pub q: Option<String>,
    pub status: Option<String>,
    pub project_id: Option<String>,
    pub open: Option<bool>,
}

impl ListParams {
    pub fn into_query(self) -> RowQuery {
        RowQuery {
            text: self.q,
            status: self.status,
            project_id: self.project_id,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(projects::router())
        .merge(improvements::router())
        .merge(tasks::router())
        .merge(notes::router())
        .merge(photos::router())
        .merge(summary::router())
        .merge(health::router())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_text_parameter_aliases() {
        for key in ["q", "query", "search"] {
            let params: ListParams =
                serde_json::from_value(serde_json::json!({ key: "oak" })).unwrap();
            assert_eq!(params.q.as_deref(), Some("oak"), "{key}");
        }
    }

    #[test]
    fn test_project_id_is_camel_case() {
        let params: ListParams =
            serde_json::from_value(serde_json::json!({ "projectId": "p-1" })).unwrap();
        assert_eq!(params.project_id.as_deref(), Some("p-1"));
    }
}
