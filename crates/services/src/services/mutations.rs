//! Write-backs to the remote store: single-field updates and record
//! creation.

use notion::{NotionApiError, NotionClient};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

use super::{
    row_mapper::page_display_title,
    schema_resolver::{LogicalField, PropertyKind, ResolvedSchema, SchemaError, SchemaResolver},
};

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("field {field} has no column in database {database_id}")]
    FieldNotSupported {
        field: LogicalField,
        database_id: String,
    },
    #[error("field {field} is a {kind} column and cannot take this value")]
    IncompatibleValue {
        field: LogicalField,
        kind: PropertyKind,
    },
    #[error("record {0} does not belong to a database")]
    NoParentDatabase(String),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("notion api error: {0}")]
    Api(#[from] NotionApiError),
}

/// Value accepted by a single-field update.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Status(String),
    Checkbox(bool),
    Relation(String),
}

/// Builds the property payload for one resolved column. Fails when the
/// observed column representation cannot take the value.
pub fn property_payload(
    field: LogicalField,
    kind: PropertyKind,
    value: &FieldValue,
) -> Result<Value, MutationError> {
    match (kind, value) {
        (PropertyKind::Status, FieldValue::Status(name)) => {
            Ok(json!({ "status": { "name": name } }))
        }
        (PropertyKind::Select, FieldValue::Status(name)) => {
            Ok(json!({ "select": { "name": name } }))
        }
        (PropertyKind::Checkbox, FieldValue::Checkbox(flag)) => Ok(json!({ "checkbox": flag })),
        (PropertyKind::Relation, FieldValue::Relation(id)) => {
            Ok(json!({ "relation": [{ "id": id }] }))
        }
        _ => Err(MutationError::IncompatibleValue { field, kind }),
    }
}

/// Request to create a task record.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Request to create a note record.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateNote {
    pub title: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Registers a photo already uploaded to external storage.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhoto {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Outcome of a task completion: the primary update always succeeded; the
/// derived note is best effort and its failure is surfaced, not hidden.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub task_id: String,
    pub followup_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_error: Option<String>,
}

#[derive(Clone)]
pub struct MutationService {
    notion: NotionClient,
    schemas: SchemaResolver,
}

impl MutationService {
    pub fn new(notion: NotionClient, schemas: SchemaResolver) -> Self {
        Self { notion, schemas }
    }

    /// Applies a single-field update to a record, resolving the owning
    /// database's schema to find the column and its representation.
    pub async fn set_field(
        &self,
        record_id: &str,
        field: LogicalField,
        value: FieldValue,
    ) -> Result<(), MutationError> {
        let page = self.notion.retrieve_page(record_id).await?;
        let database_id = page
            .parent
            .database_id
            .clone()
            .ok_or_else(|| MutationError::NoParentDatabase(record_id.to_string()))?;
        let schema = self.schemas.resolve(&database_id).await?;

        let resolved = schema
            .field(field)
            .ok_or_else(|| MutationError::FieldNotSupported {
                field,
                database_id: database_id.clone(),
            })?;
        let payload = property_payload(field, resolved.kind, &value)?;

        let mut properties = serde_json::Map::new();
        properties.insert(resolved.name.clone(), payload);
        self.notion
            .update_page(record_id, Value::Object(properties))
            .await?;

        info!(record_id, field = %field, database_id, "updated record field");
        Ok(())
    }

    pub async fn create_task(
        &self,
        database_id: &str,
        request: &CreateTask,
    ) -> Result<String, MutationError> {
        let schema = self.schemas.resolve(database_id).await?;
        let mut properties = serde_json::Map::new();
        properties.insert(
            title_column(&schema, database_id)?,
            title_payload(&request.title),
        );

        if let (Some(project_id), Some(resolved)) =
            (&request.project_id, schema.field(LogicalField::Project))
        {
            if resolved.kind == PropertyKind::Relation {
                properties.insert(
                    resolved.name.clone(),
                    json!({ "relation": [{ "id": project_id }] }),
                );
            }
        }

        if let (Some(status), Some(resolved)) =
            (&request.status, schema.field(LogicalField::Status))
        {
            if let Ok(payload) = property_payload(
                LogicalField::Status,
                resolved.kind,
                &FieldValue::Status(status.clone()),
            ) {
                properties.insert(resolved.name.clone(), payload);
            }
        }

        let page = self.create_in(database_id, properties).await?;
        info!(database_id, page_id = %page, "created task record");
        Ok(page)
    }

    pub async fn create_note(
        &self,
        database_id: &str,
        request: &CreateNote,
    ) -> Result<String, MutationError> {
        let schema = self.schemas.resolve(database_id).await?;
        let mut properties = serde_json::Map::new();
        properties.insert(
            title_column(&schema, database_id)?,
            title_payload(&request.title),
        );

        if let (Some(project_id), Some(resolved)) =
            (&request.project_id, schema.field(LogicalField::Project))
        {
            if resolved.kind == PropertyKind::Relation {
                properties.insert(
                    resolved.name.clone(),
                    json!({ "relation": [{ "id": project_id }] }),
                );
            }
        }

        self.create_in(database_id, properties).await
    }

    pub async fn create_photo(
        &self,
        database_id: &str,
        request: &CreatePhoto,
    ) -> Result<String, MutationError> {
        let schema = self.schemas.resolve(database_id).await?;
        let caption = request.caption.as_deref().unwrap_or("Photo");

        let files = schema
            .field(LogicalField::Photos)
            .filter(|f| f.kind == PropertyKind::Files)
            .ok_or_else(|| MutationError::FieldNotSupported {
                field: LogicalField::Photos,
                database_id: database_id.to_string(),
            })?;

        let mut properties = serde_json::Map::new();
        properties.insert(title_column(&schema, database_id)?, title_payload(caption));
        properties.insert(
            files.name.clone(),
            json!({ "files": [{
                "name": caption,
                "type": "external",
                "external": { "url": request.url }
            }]}),
        );

        if let (Some(project_id), Some(resolved)) =
            (&request.project_id, schema.field(LogicalField::Project))
        {
            if resolved.kind == PropertyKind::Relation {
                properties.insert(
                    resolved.name.clone(),
                    json!({ "relation": [{ "id": project_id }] }),
                );
            }
        }

        self.create_in(database_id, properties).await
    }

    /// Marks a task done and, best effort, records a follow-up note. The
    /// note failure never rolls the completion back; it is reported in the
    /// outcome instead.
    pub async fn complete_task(
        &self,
        task_id: &str,
        notes_database_id: &str,
    ) -> Result<CompletionOutcome, MutationError> {
        let page = self.notion.retrieve_page(task_id).await?;
        let database_id = page
            .parent
            .database_id
            .clone()
            .ok_or_else(|| MutationError::NoParentDatabase(task_id.to_string()))?;
        let schema = self.schemas.resolve(&database_id).await?;

        // Prefer the done checkbox when the board has one, otherwise flip
        // the status column.
        if let Some(done) = schema
            .field(LogicalField::Done)
            .filter(|f| f.kind == PropertyKind::Checkbox)
        {
            let mut properties = serde_json::Map::new();
            properties.insert(done.name.clone(), json!({ "checkbox": true }));
            self.notion
                .update_page(task_id, Value::Object(properties))
                .await?;
        } else if let Some(status) = schema.field(LogicalField::Status) {
            let payload = property_payload(
                LogicalField::Status,
                status.kind,
                &FieldValue::Status("Done".to_string()),
            )?;
            let mut properties = serde_json::Map::new();
            properties.insert(status.name.clone(), payload);
            self.notion
                .update_page(task_id, Value::Object(properties))
                .await?;
        } else {
            return Err(MutationError::FieldNotSupported {
                field: LogicalField::Done,
                database_id,
            });
        }

        let note = CreateNote {
            title: format!("Completed: {}", page_display_title(&page)),
            project_id: schema
                .field(LogicalField::Project)
                .and_then(|f| page.properties.get(&f.name))
                .and_then(|v| v.relation.as_ref())
                .and_then(|refs| refs.first())
                .map(|r| r.id.clone()),
        };

        match self.create_note(notes_database_id, &note).await {
            Ok(note_id) => {
                info!(task_id, note_id, "task completed, follow-up note recorded");
                Ok(CompletionOutcome {
                    task_id: task_id.to_string(),
                    followup_created: true,
                    followup_error: None,
                })
            }
            Err(e) => {
                warn!(task_id, error = %e, "follow-up note creation failed after task completion");
                Ok(CompletionOutcome {
                    task_id: task_id.to_string(),
                    followup_created: false,
                    followup_error: Some(e.to_string()),
                })
            }
        }
    }

    async fn create_in(
        &self,
        database_id: &str,
        properties: serde_json::Map<String, Value>,
    ) -> Result<String, MutationError> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties
        });
        let page = self.notion.create_page(&body).await?;
        Ok(page.id)
    }
}

fn title_column(schema: &ResolvedSchema, database_id: &str) -> Result<String, MutationError> {
    schema
        .field(LogicalField::Title)
        .map(|f| f.name.clone())
        .ok_or_else(|| MutationError::FieldNotSupported {
            field: LogicalField::Title,
            database_id: database_id.to_string(),
        })
}

fn title_payload(text: &str) -> Value {
    json!({ "title": [{ "text": { "content": text } }] })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use notion::{Page, PropertySpec};
    use serde_json::json;

    use super::super::row_mapper::map_row;
    use super::*;

    fn schema(columns: &[(&str, &str)]) -> ResolvedSchema {
        let properties: HashMap<String, PropertySpec> = columns
            .iter()
            .map(|(name, kind)| {
                (
                    (*name).to_string(),
                    PropertySpec {
                        kind: (*kind).to_string(),
                        ..PropertySpec::default()
                    },
                )
            })
            .collect();
        ResolvedSchema::from_properties("db", &properties).unwrap()
    }

    #[test]
    fn test_status_payload_follows_observed_kind() {
        let value = FieldValue::Status("Done".to_string());
        assert_eq!(
            property_payload(LogicalField::Status, PropertyKind::Status, &value).unwrap(),
            json!({ "status": { "name": "Done" } })
        );
        assert_eq!(
            property_payload(LogicalField::Status, PropertyKind::Select, &value).unwrap(),
            json!({ "select": { "name": "Done" } })
        );
    }

    #[test]
    fn test_checkbox_and_relation_payloads() {
        assert_eq!(
            property_payload(
                LogicalField::JobAccount,
                PropertyKind::Checkbox,
                &FieldValue::Checkbox(true)
            )
            .unwrap(),
            json!({ "checkbox": true })
        );
        assert_eq!(
            property_payload(
                LogicalField::Project,
                PropertyKind::Relation,
                &FieldValue::Relation("proj-1".to_string())
            )
            .unwrap(),
            json!({ "relation": [{ "id": "proj-1" }] })
        );
    }

    #[test]
    fn test_incompatible_value_is_rejected() {
        let err = property_payload(
            LogicalField::Status,
            PropertyKind::Checkbox,
            &FieldValue::Status("Done".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, MutationError::IncompatibleValue { .. }));
    }

    #[test]
    fn test_status_write_round_trips_through_mapper() {
        // What a write produces must read back as the same status string,
        // for both underlying representations.
        for kind in ["status", "select"] {
            let schema = schema(&[("Project", "title"), ("Status", kind)]);
            let resolved = schema.field(LogicalField::Status).unwrap();
            let payload = property_payload(
                LogicalField::Status,
                resolved.kind,
                &FieldValue::Status("In Progress".to_string()),
            )
            .unwrap();

            let page: Page = serde_json::from_value(json!({
                "id": "t-1",
                "properties": {
                    "Project": { "type": "title", "title": [{ "plain_text": "Oak" }] },
                    "Status": payload
                }
            }))
            .unwrap();

            let row = map_row(&schema, &page);
            assert_eq!(row.status.as_deref(), Some("In Progress"), "{kind}");
        }
    }

    #[test]
    fn test_title_payload_shape() {
        assert_eq!(
            title_payload("Pour footings"),
            json!({ "title": [{ "text": { "content": "Pour footings" } }] })
        );
    }
}
