//! Translates dashboard search criteria into the remote store's filter
//! grammar, using resolved column names.

use serde::Deserialize;
use serde_json::{Value, json};
use ts_rs::TS;

use super::schema_resolver::{LogicalField, PropertyKind, ResolvedSchema};

/// Criteria supported by the list endpoints.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RowQuery {
    pub text: Option<String>,
    pub status: Option<String>,
    pub project_id: Option<String>,
}

impl RowQuery {
    /// Normalized cache key for a query against one database.
    pub fn cache_key(&self, database_id: &str) -> String {
        format!(
            "{}|{}|{}|{}",
            database_id,
            self.text.as_deref().unwrap_or("").trim().to_lowercase(),
            self.status.as_deref().unwrap_or("").trim(),
            self.project_id.as_deref().unwrap_or("").trim(),
        )
    }
}

/// Builds the native filter for the given criteria, or `None` when no
/// clause applies. Unresolved columns are silently left out; precision
/// degrades instead of failing.
pub fn build_filter(schema: &ResolvedSchema, query: &RowQuery) -> Option<Value> {
    let mut clauses = Vec::new();

    if let Some(text) = normalized(query.text.as_deref()) {
        let mut any = Vec::new();
        for field in [
            LogicalField::Title,
            LogicalField::Client,
            LogicalField::Location,
        ] {
            if let Some(resolved) = schema.field(field) {
                if let Some(clause) = contains_clause(&resolved.name, resolved.kind, text) {
                    any.push(clause);
                }
            }
        }

        // A term that reads as a number also matches the bid number exactly.
        if let Ok(number) = text.parse::<f64>() {
            if let Some(resolved) = schema.field(LogicalField::BidNumber) {
                if resolved.kind == PropertyKind::Number {
                    any.push(json!({
                        "property": resolved.name,
                        "number": { "equals": number }
                    }));
                }
            }
        }

        match any.len() {
            0 => {}
            1 => clauses.push(any.pop().unwrap()),
            _ => clauses.push(json!({ "or": any })),
        }
    }

    if let Some(status) = normalized(query.status.as_deref()) {
        if let Some(clause) = schema
            .field(LogicalField::Status)
            .and_then(|f| equals_clause(&f.name, f.kind, status))
        {
            clauses.push(clause);
        }
    }

    if let Some(project_id) = normalized(query.project_id.as_deref()) {
        if let Some(resolved) = schema
            .field(LogicalField::Project)
            .filter(|f| f.kind == PropertyKind::Relation)
        {
            clauses.push(json!({
                "property": resolved.name,
                "relation": { "contains": project_id }
            }));
        }
    }

    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "and": clauses })),
    }
}

/// Most recently edited first; the walker preserves this order across
/// pages.
pub fn default_sorts() -> Vec<Value> {
    vec![json!({ "timestamp": "last_edited_time", "direction": "descending" })]
}

fn normalized(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn contains_clause(name: &str, kind: PropertyKind, text: &str) -> Option<Value> {
    match kind {
        PropertyKind::Title => Some(json!({ "property": name, "title": { "contains": text } })),
        PropertyKind::RichText => {
            Some(json!({ "property": name, "rich_text": { "contains": text } }))
        }
        _ => None,
    }
}

fn equals_clause(name: &str, kind: PropertyKind, value: &str) -> Option<Value> {
    match kind {
        PropertyKind::Status => Some(json!({ "property": name, "status": { "equals": value } })),
        PropertyKind::Select => Some(json!({ "property": name, "select": { "equals": value } })),
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

    fn text_query(text: &str) -> RowQuery {
        RowQuery {
            text: Some(text.to_string()),
            ..RowQuery::default()
        }
    }

    #[test]
    fn test_free_text_ors_across_text_columns() {
        let schema = schema(&[
            ("Project", "title"),
            ("Client", "rich_text"),
            ("Location", "rich_text"),
        ]);
        let filter = build_filter(&schema, &text_query("oak")).unwrap();

        assert_eq!(
            filter,
            json!({ "or": [
                { "property": "Project", "title": { "contains": "oak" } },
                { "property": "Client", "rich_text": { "contains": "oak" } },
                { "property": "Location", "rich_text": { "contains": "oak" } },
            ]})
        );
    }

    #[test]
    fn test_single_clause_is_not_wrapped() {
        let schema = schema(&[("Project", "title")]);
        let filter = build_filter(&schema, &text_query("oak")).unwrap();
        assert_eq!(
            filter,
            json!({ "property": "Project", "title": { "contains": "oak" } })
        );
    }

    #[test]
    fn test_numeric_term_also_matches_bid_number() {
        let schema = schema(&[("Project", "title"), ("Bid Number", "number")]);
        let filter = build_filter(&schema, &text_query("4817")).unwrap();

        assert_eq!(
            filter,
            json!({ "or": [
                { "property": "Project", "title": { "contains": "4817" } },
                { "property": "Bid Number", "number": { "equals": 4817.0 } },
            ]})
        );
    }

    #[test]
    fn test_status_filter_follows_observed_kind() {
        let as_status = schema(&[("Project", "title"), ("Status", "status")]);
        let query = RowQuery {
            status: Some("Bid".to_string()),
            ..RowQuery::default()
        };
        assert_eq!(
            build_filter(&as_status, &query).unwrap(),
            json!({ "property": "Status", "status": { "equals": "Bid" } })
        );

        let as_select = schema(&[("Project", "title"), ("Status", "select")]);
        assert_eq!(
            build_filter(&as_select, &query).unwrap(),
            json!({ "property": "Status", "select": { "equals": "Bid" } })
        );
    }

    #[test]
    fn test_text_and_status_combine_with_and() {
        let schema = schema(&[("Project", "title"), ("Status", "status")]);
        let query = RowQuery {
            text: Some("oak".to_string()),
            status: Some("Bid".to_string()),
            ..RowQuery::default()
        };
        let filter = build_filter(&schema, &query).unwrap();

        assert_eq!(
            filter,
            json!({ "and": [
                { "property": "Project", "title": { "contains": "oak" } },
                { "property": "Status", "status": { "equals": "Bid" } },
            ]})
        );
    }

    #[test]
    fn test_project_relation_filter() {
        let schema = schema(&[("Task", "title"), ("Project", "relation")]);
        let query = RowQuery {
            project_id: Some("proj-1".to_string()),
            ..RowQuery::default()
        };
        assert_eq!(
            build_filter(&schema, &query).unwrap(),
            json!({ "property": "Project", "relation": { "contains": "proj-1" } })
        );
    }

    #[test]
    fn test_missing_columns_degrade_silently() {
        // No client, location, or status columns: the filter shrinks to the
        // title clause instead of erroring.
        let schema = schema(&[("Project", "title")]);
        let query = RowQuery {
            text: Some("oak".to_string()),
            status: Some("Bid".to_string()),
            project_id: Some("proj-1".to_string()),
        };
        assert_eq!(
            build_filter(&schema, &query).unwrap(),
            json!({ "property": "Project", "title": { "contains": "oak" } })
        );
    }

    #[test]
    fn test_empty_criteria_build_no_filter() {
        let schema = schema(&[("Project", "title")]);
        assert!(build_filter(&schema, &RowQuery::default()).is_none());

        let blank = RowQuery {
            text: Some("   ".to_string()),
            ..RowQuery::default()
        };
        assert!(build_filter(&schema, &blank).is_none());
    }

    #[test]
    fn test_cache_key_normalizes_text() {
        let a = text_query(" Oak ").cache_key("db");
        let b = text_query("oak").cache_key("db");
        assert_eq!(a, b);
        assert_ne!(a, text_query("elm").cache_key("db"));
    }
}
