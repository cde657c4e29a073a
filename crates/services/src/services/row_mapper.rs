//! Flattens raw records into the UI-facing row shape.

use chrono::{DateTime, Utc};
use notion::{Page, PropertyValue, join_plain_text};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::schema_resolver::{LogicalField, PropertyKind, ResolvedField, ResolvedSchema};

/// Flattened view of one remote record. Fields whose logical column is
/// missing from the live schema stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: String,
    pub title: String,
    pub status: Option<String>,
    pub client: Option<String>,
    pub location: Option<String>,
    pub deadline: Option<String>,
    pub budget: Option<f64>,
    pub spent: Option<f64>,
    pub bid_number: Option<f64>,
    pub job_account: Option<bool>,
    pub follow_up: Option<bool>,
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub photos: Vec<String>,
    pub url: String,
    pub last_edited: Option<DateTime<Utc>>,
    /// Relation target still needing a display-label lookup.
    #[serde(skip)]
    pub client_relation: Option<String>,
}

/// Maps one raw record onto the row shape. Pure except that a
/// relation-typed client column is deferred into `client_relation` for the
/// caller to resolve.
pub fn map_row(schema: &ResolvedSchema, page: &Page) -> Row {
    let mut row = Row {
        id: page.id.clone(),
        url: page.url.clone(),
        last_edited: page.last_edited_time,
        ..Row::default()
    };

    row.title = prop(schema, page, LogicalField::Title)
        .and_then(|(_, v)| v.title.as_deref())
        .map(join_plain_text)
        .unwrap_or_default();

    row.status =
        prop(schema, page, LogicalField::Status).and_then(|(f, v)| status_text(f.kind, v));

    match prop(schema, page, LogicalField::Client) {
        Some((f, v)) if f.kind == PropertyKind::Relation => {
            row.client_relation = v
                .relation
                .as_ref()
                .and_then(|refs| refs.first())
                .map(|r| r.id.clone());
        }
        Some((f, v)) => row.client = inline_text(f.kind, v),
        None => {}
    }

    row.location =
        prop(schema, page, LogicalField::Location).and_then(|(f, v)| inline_text(f.kind, v));
    row.deadline = prop(schema, page, LogicalField::Deadline)
        .and_then(|(_, v)| v.date.as_ref())
        .map(|d| d.start.clone());
    row.budget = prop(schema, page, LogicalField::Budget).and_then(|(_, v)| v.number);
    row.spent = prop(schema, page, LogicalField::Spent).and_then(|(_, v)| v.number);
    row.bid_number = prop(schema, page, LogicalField::BidNumber).and_then(|(_, v)| v.number);
    row.job_account = prop(schema, page, LogicalField::JobAccount).and_then(|(_, v)| v.checkbox);
    row.follow_up = prop(schema, page, LogicalField::FollowUp).and_then(|(_, v)| v.checkbox);
    row.done = prop(schema, page, LogicalField::Done).and_then(|(_, v)| v.checkbox);
    row.photos = prop(schema, page, LogicalField::Photos)
        .and_then(|(_, v)| v.files.as_ref())
        .map(|files| {
            files
                .iter()
                .filter_map(|f| f.url())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    row
}

/// Display label for a record used as a relation target: title text, then
/// the last path segment of its canonical link, then "Untitled".
pub fn page_display_title(page: &Page) -> String {
    let title = page
        .properties
        .values()
        .find_map(|v| v.title.as_deref())
        .map(join_plain_text)
        .unwrap_or_default();
    if !title.is_empty() {
        return title;
    }

    page.url
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "Untitled".to_string())
}

fn prop<'a>(
    schema: &'a ResolvedSchema,
    page: &'a Page,
    field: LogicalField,
) -> Option<(&'a ResolvedField, &'a PropertyValue)> {
    let resolved = schema.field(field)?;
    let value = page.properties.get(&resolved.name)?;
    Some((resolved, value))
}

fn status_text(kind: PropertyKind, value: &PropertyValue) -> Option<String> {
    match kind {
        PropertyKind::Status => value.status.as_ref().map(|s| s.name.clone()),
        PropertyKind::Select => value.select.as_ref().map(|s| s.name.clone()),
        _ => None,
    }
}

/// Inline text for columns that users author as any of several text-ish
/// types.
fn inline_text(kind: PropertyKind, value: &PropertyValue) -> Option<String> {
    match kind {
        PropertyKind::Title => value
            .title
            .as_deref()
            .map(join_plain_text)
            .filter(|t| !t.is_empty()),
        PropertyKind::RichText => value
            .rich_text
            .as_deref()
            .map(join_plain_text)
            .filter(|t| !t.is_empty()),
        PropertyKind::Select | PropertyKind::Status => status_text(kind, value),
        PropertyKind::Url => value.url.clone(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use notion::PropertySpec;
    use serde_json::json;

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

    fn page(properties: serde_json::Value) -> Page {
        serde_json::from_value(json!({
            "id": "p-1",
            "url": "https://www.notion.so/Oak-abc123",
            "properties": properties
        }))
        .unwrap()
    }

    #[test]
    fn test_maps_full_row() {
        let schema = schema(&[
            ("Project", "title"),
            ("Status", "status"),
            ("Client", "rich_text"),
            ("Location", "rich_text"),
            ("Deadline", "date"),
            ("Budget", "number"),
            ("Job Account", "checkbox"),
        ]);
        let page = page(json!({
            "Project": { "type": "title", "title": [{ "plain_text": "Oak St Job" }] },
            "Status": { "type": "status", "status": { "name": "In Progress" } },
            "Client": { "type": "rich_text", "rich_text": [{ "plain_text": "Acme GC" }] },
            "Location": { "type": "rich_text", "rich_text": [{ "plain_text": "Tulsa" }] },
            "Deadline": { "type": "date", "date": { "start": "2026-09-01" } },
            "Budget": { "type": "number", "number": 125000.0 },
            "Job Account": { "type": "checkbox", "checkbox": false }
        }));

        let row = map_row(&schema, &page);
        assert_eq!(row.title, "Oak St Job");
        assert_eq!(row.status.as_deref(), Some("In Progress"));
        assert_eq!(row.client.as_deref(), Some("Acme GC"));
        assert_eq!(row.location.as_deref(), Some("Tulsa"));
        assert_eq!(row.deadline.as_deref(), Some("2026-09-01"));
        assert_eq!(row.budget, Some(125000.0));
        assert_eq!(row.job_account, Some(false));
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let schema = schema(&[("Project", "title")]);
        let page = page(json!({
            "Project": { "type": "title", "title": [{ "plain_text": "Bare" }] }
        }));

        let row = map_row(&schema, &page);
        assert_eq!(row.title, "Bare");
        assert!(row.status.is_none());
        assert!(row.client.is_none());
        assert!(row.deadline.is_none());
        assert!(row.budget.is_none());
        assert!(row.job_account.is_none());
        assert!(row.photos.is_empty());
    }

    #[test]
    fn test_relation_client_is_deferred() {
        let schema = schema(&[("Project", "title"), ("Client", "relation")]);
        let page = page(json!({
            "Project": { "type": "title", "title": [{ "plain_text": "Oak" }] },
            "Client": { "type": "relation", "relation": [{ "id": "client-9" }] }
        }));

        let row = map_row(&schema, &page);
        assert!(row.client.is_none());
        assert_eq!(row.client_relation.as_deref(), Some("client-9"));
    }

    #[test]
    fn test_select_status_maps_by_observed_kind() {
        let schema = schema(&[("Project", "title"), ("Status", "select")]);
        let page = page(json!({
            "Project": { "type": "title", "title": [{ "plain_text": "Oak" }] },
            "Status": { "type": "select", "select": { "name": "Bid" } }
        }));
        assert_eq!(map_row(&schema, &page).status.as_deref(), Some("Bid"));
    }

    #[test]
    fn test_photo_urls_are_collected() {
        let schema = schema(&[("Name", "title"), ("Photos", "files")]);
        let page = page(json!({
            "Name": { "type": "title", "title": [{ "plain_text": "Pour day" }] },
            "Photos": { "type": "files", "files": [
                { "name": "a.jpg", "external": { "url": "https://cdn.example.com/a.jpg" } },
                { "name": "b.jpg", "file": { "url": "https://files.example.com/b.jpg" } }
            ]}
        }));

        assert_eq!(
            map_row(&schema, &page).photos,
            [
                "https://cdn.example.com/a.jpg",
                "https://files.example.com/b.jpg"
            ]
        );
    }

    #[test]
    fn test_display_title_prefers_title_text() {
        let page = page(json!({
            "Name": { "type": "title", "title": [{ "plain_text": "Acme GC" }] }
        }));
        assert_eq!(page_display_title(&page), "Acme GC");
    }

    #[test]
    fn test_display_title_falls_back_to_link_segment() {
        let page: Page = serde_json::from_value(json!({
            "id": "r-1",
            "url": "https://www.notion.so/abc123",
            "properties": { "Name": { "type": "title", "title": [] } }
        }))
        .unwrap();
        assert_eq!(page_display_title(&page), "abc123");
    }

    #[test]
    fn test_display_title_last_resort_is_untitled() {
        let page: Page = serde_json::from_value(json!({ "id": "r-2" })).unwrap();
        assert_eq!(page_display_title(&page), "Untitled");
    }
}
