//! Maps logical dashboard fields onto whatever column names the crew
//! actually chose in each remote database.

use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use notion::{Database, NotionApiError, NotionClient, PropertySpec};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::debug;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("database {0} has no title column")]
    NoTitleColumn(String),
    #[error("notion api error: {0}")]
    Api(#[from] NotionApiError),
}

/// Stable internal field names, independent of the column names end users
/// picked in the remote databases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum LogicalField {
    Title,
    Status,
    Client,
    Location,
    Deadline,
    Budget,
    Spent,
    BidNumber,
    JobAccount,
    FollowUp,
    Done,
    Project,
    Photos,
}

impl LogicalField {
    pub const ALL: [LogicalField; 13] = [
        LogicalField::Title,
        LogicalField::Status,
        LogicalField::Client,
        LogicalField::Location,
        LogicalField::Deadline,
        LogicalField::Budget,
        LogicalField::Spent,
        LogicalField::BidNumber,
        LogicalField::JobAccount,
        LogicalField::FollowUp,
        LogicalField::Done,
        LogicalField::Project,
        LogicalField::Photos,
    ];

    /// Acceptable column names, in priority order. The first alias present
    /// in the live schema wins.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            LogicalField::Title => &["Project", "Name", "Title", "Job", "Task"],
            LogicalField::Status => &["Status", "Stage", "Phase"],
            LogicalField::Client => &["Client", "Customer", "Client Name", "GC"],
            LogicalField::Location => &["Location", "Address", "City"],
            LogicalField::Deadline => &["Deadline", "Due Date", "Due", "Completion Date"],
            LogicalField::Budget => &["Budget", "Contract Amount", "Bid Amount"],
            LogicalField::Spent => &["Spent", "Actual Cost", "Costs"],
            LogicalField::BidNumber => &["Bid Number", "Bid #", "Job Number"],
            LogicalField::JobAccount => &["Job Account", "Job Account Setup", "Account Setup"],
            LogicalField::FollowUp => &["Follow Up", "Follow-up", "Needs Follow Up"],
            LogicalField::Done => &["Done", "Complete", "Completed"],
            LogicalField::Project => &["Project", "Job", "Related Project"],
            LogicalField::Photos => &["Photo", "Photos", "Image", "Files"],
        }
    }
}

/// Underlying value representation observed for a resolved column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyKind {
    Title,
    RichText,
    Select,
    Status,
    Checkbox,
    Number,
    Date,
    Relation,
    Url,
    Files,
    Other,
}

impl PropertyKind {
    fn from_schema(kind: &str) -> Self {
        match kind {
            "title" => PropertyKind::Title,
            "rich_text" => PropertyKind::RichText,
            "select" => PropertyKind::Select,
            "status" => PropertyKind::Status,
            "checkbox" => PropertyKind::Checkbox,
            "number" => PropertyKind::Number,
            "date" => PropertyKind::Date,
            "relation" => PropertyKind::Relation,
            "url" => PropertyKind::Url,
            "files" => PropertyKind::Files,
            _ => PropertyKind::Other,
        }
    }
}

/// A logical field's resolved column: its actual name and the value
/// representation it was observed to use.
#[derive(Debug, Clone, Serialize, TS)]
pub struct ResolvedField {
    pub name: String,
    pub kind: PropertyKind,
}

/// Immutable lookup table produced by one resolution pass over a database
/// schema.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub database_id: String,
    fields: HashMap<LogicalField, ResolvedField>,
    status_options: Vec<String>,
}

impl ResolvedSchema {
    pub fn from_database(database: &Database) -> Result<Self, SchemaError> {
        Self::from_properties(&database.id, &database.properties)
    }

    /// One pass over the property set: for each logical field the first
    /// alias present wins; the title field additionally falls back to
    /// whichever column the schema marks as title-typed.
    pub fn from_properties(
        database_id: &str,
        properties: &HashMap<String, PropertySpec>,
    ) -> Result<Self, SchemaError> {
        let mut fields = HashMap::new();
        for field in LogicalField::ALL {
            if let Some(resolved) = resolve_field(field, properties) {
                fields.insert(field, resolved);
            }
        }

        if !fields.contains_key(&LogicalField::Title) {
            return Err(SchemaError::NoTitleColumn(database_id.to_string()));
        }

        let status_options = fields
            .get(&LogicalField::Status)
            .and_then(|f| properties.get(&f.name))
            .map(option_names)
            .unwrap_or_default();

        Ok(Self {
            database_id: database_id.to_string(),
            fields,
            status_options,
        })
    }

    pub fn field(&self, field: LogicalField) -> Option<&ResolvedField> {
        self.fields.get(&field)
    }

    pub fn column(&self, field: LogicalField) -> Option<&str> {
        self.fields.get(&field).map(|f| f.name.as_str())
    }

    pub fn status_options(&self) -> &[String] {
        &self.status_options
    }
}

fn resolve_field(
    field: LogicalField,
    properties: &HashMap<String, PropertySpec>,
) -> Option<ResolvedField> {
    for alias in field.aliases() {
        if let Some(spec) = properties.get(*alias) {
            let kind = PropertyKind::from_schema(&spec.kind);
            // A column named like the title alias but typed otherwise (a
            // "Project" relation on the tasks board) must not shadow the
            // real title column.
            if field == LogicalField::Title && kind != PropertyKind::Title {
                continue;
            }
            return Some(ResolvedField {
                name: (*alias).to_string(),
                kind,
            });
        }
    }

    if field == LogicalField::Title {
        return properties
            .iter()
            .find(|(_, spec)| spec.kind == "title")
            .map(|(name, _)| ResolvedField {
                name: name.clone(),
                kind: PropertyKind::Title,
            });
    }

    None
}

fn option_names(spec: &PropertySpec) -> Vec<String> {
    spec.status
        .as_ref()
        .or(spec.select.as_ref())
        .map(|cfg| cfg.options.iter().map(|o| o.name.clone()).collect())
        .unwrap_or_default()
}

/// Resolves and memoizes one schema per database for the life of the
/// process. Schema drift after startup is not observed until restart.
#[derive(Clone)]
pub struct SchemaResolver {
    notion: NotionClient,
    cache: Arc<DashMap<String, Arc<ResolvedSchema>>>,
}

impl SchemaResolver {
    pub fn new(notion: NotionClient) -> Self {
        Self {
            notion,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Idempotent: the first call per database fetches the remote schema,
    /// every later call returns the cached result.
    pub async fn resolve(&self, database_id: &str) -> Result<Arc<ResolvedSchema>, SchemaError> {
        if let Some(cached) = self.cache.get(database_id) {
            return Ok(cached.clone());
        }

        let database = self.notion.retrieve_database(database_id).await?;
        let resolved = Arc::new(ResolvedSchema::from_database(&database)?);
        debug!(
            database_id,
            fields = resolved.fields.len(),
            "resolved remote schema"
        );
        self.cache.insert(database_id.to_string(), resolved.clone());
        Ok(resolved)
    }
}
