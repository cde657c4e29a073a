//! Wire types for the subset of the Notion API the dashboard consumes.
//! Every payload field is optional-with-default so that user-driven schema
//! drift degrades to missing values instead of decode failures.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rich text fragment; only the rendered text matters to the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

/// Concatenates the rendered text of a rich text array.
pub fn join_plain_text(fragments: &[RichText]) -> String {
    fragments.iter().map(|f| f.plain_text.as_str()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectValue {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectConfig {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedFile {
    pub url: String,
}

/// One file attachment. Uploads and external links carry their URL under
/// different keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub file: Option<HostedFile>,
    #[serde(default)]
    pub external: Option<ExternalFile>,
}

impl FileRef {
    pub fn url(&self) -> Option<&str> {
        self.external
            .as_ref()
            .map(|f| f.url.as_str())
            .or_else(|| self.file.as_ref().map(|f| f.url.as_str()))
    }
}

/// Column descriptor from a database schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertySpec {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub select: Option<SelectConfig>,
    #[serde(default)]
    pub status: Option<SelectConfig>,
}

/// A database object: its human title plus the live property set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Database {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RichText>,
    #[serde(default)]
    pub properties: HashMap<String, PropertySpec>,
}

impl Database {
    pub fn title_text(&self) -> String {
        join_plain_text(&self.title)
    }
}

/// A property value as it appears on a page. The payload key mirrors the
/// column type; an unknown type simply leaves every payload empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyValue {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<Vec<RichText>>,
    #[serde(default)]
    pub rich_text: Option<Vec<RichText>>,
    #[serde(default)]
    pub select: Option<SelectValue>,
    #[serde(default)]
    pub status: Option<SelectValue>,
    #[serde(default)]
    pub checkbox: Option<bool>,
    #[serde(default)]
    pub number: Option<f64>,
    #[serde(default)]
    pub date: Option<DateValue>,
    #[serde(default)]
    pub relation: Option<Vec<RelationRef>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<FileRef>>,
}

/// Owning container of a page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parent {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub database_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub parent: Parent,
    #[serde(default)]
    pub last_edited_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

/// Body for the paged database query endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// One page of query results plus the continuation cursor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
