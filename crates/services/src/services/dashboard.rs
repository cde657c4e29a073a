//! Read-side composition: query, walk, map, label, cache, plus the KPI
//! predicates applied on top of full row sets.

use std::{sync::Arc, time::Duration};

use moka::future::Cache;
use notion::{NotionApiError, NotionClient};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use ts_rs::TS;

use super::{
    page_walker,
    query_builder::{self, RowQuery},
    relation_titles::RelationTitleResolver,
    row_mapper::{self, Row},
    schema_resolver::{SchemaError, SchemaResolver},
};

/// How long a computed result set may be served before re-reading the
/// store.
const QUERY_CACHE_TTL: Duration = Duration::from_secs(30);
const QUERY_CACHE_CAPACITY: u64 = 256;

/// Statuses containing any of these words count as finished.
const CLOSED_STATUS_WORDS: [&str; 4] = ["done", "resolved", "closed", "complete"];

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("notion api error: {0}")]
    Api(#[from] NotionApiError),
}

/// Identifiers of the remote databases backing each board.
#[derive(Debug, Clone)]
pub struct DatabaseIds {
    pub projects: String,
    pub improvements: String,
    pub notes: String,
    pub tasks: String,
    pub photos: String,
}

/// KPI counters shown on the dashboard home.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub active_bids: usize,
    pub job_accounts_pending: usize,
    pub open_improvements: usize,
    pub open_tasks: usize,
}

#[derive(Clone)]
pub struct DashboardService {
    notion: NotionClient,
    schemas: SchemaResolver,
    relations: RelationTitleResolver,
    query_cache: Cache<String, Arc<Vec<Row>>>,
    databases: DatabaseIds,
}

impl DashboardService {
    pub fn new(notion: NotionClient, schemas: SchemaResolver, databases: DatabaseIds) -> Self {
        Self {
            relations: RelationTitleResolver::new(notion.clone()),
            query_cache: Cache::builder()
                .max_capacity(QUERY_CACHE_CAPACITY)
                .time_to_live(QUERY_CACHE_TTL)
                .build(),
            notion,
            schemas,
            databases,
        }
    }

    pub fn databases(&self) -> &DatabaseIds {
        &self.databases
    }

    /// Full row set for one database. Served from the query cache when the
    /// same normalized criteria were computed within the TTL.
    pub async fn list_rows(
        &self,
        database_id: &str,
        query: &RowQuery,
    ) -> Result<Arc<Vec<Row>>, DashboardError> {
        let key = query.cache_key(database_id);
        if let Some(hit) = self.query_cache.get(&key).await {
            return Ok(hit);
        }

        let rows = Arc::new(self.fetch_rows(database_id, query).await?);
        self.query_cache.insert(key, rows.clone()).await;
        Ok(rows)
    }

    async fn fetch_rows(
        &self,
        database_id: &str,
        query: &RowQuery,
    ) -> Result<Vec<Row>, DashboardError> {
        let schema = self.schemas.resolve(database_id).await?;
        let filter = query_builder::build_filter(&schema, query);
        let pages = page_walker::collect_all(
            &self.notion,
            database_id,
            filter,
            query_builder::default_sorts(),
        )
        .await?;

        let mut rows: Vec<Row> = pages.iter().map(|p| row_mapper::map_row(&schema, p)).collect();
        self.relations.label_rows(&mut rows).await?;

        debug!(database_id, rows = rows.len(), "fetched row set");
        Ok(rows)
    }

    /// Status options for a board, from the resolved schema.
    pub async fn status_options(&self, database_id: &str) -> Result<Vec<String>, DashboardError> {
        Ok(self
            .schemas
            .resolve(database_id)
            .await?
            .status_options()
            .to_vec())
    }

    /// KPI roll-up: one read per counter, all four issued concurrently.
    /// The query cache coalesces the reads that hit the same board.
    pub async fn summary(&self) -> Result<Summary, DashboardError> {
        let everything = RowQuery::default();
        let (bid_rows, account_rows, improvement_rows, task_rows) = tokio::try_join!(
            self.list_rows(&self.databases.projects, &everything),
            self.list_rows(&self.databases.projects, &everything),
            self.list_rows(&self.databases.improvements, &everything),
            self.list_rows(&self.databases.tasks, &everything),
        )?;

        Ok(Summary {
            active_bids: bid_rows.iter().filter(|r| is_active_bid(r)).count(),
            job_accounts_pending: account_rows
                .iter()
                .filter(|r| is_job_account_pending(r))
                .count(),
            open_improvements: improvement_rows.iter().filter(|r| is_open(r)).count(),
            open_tasks: task_rows.iter().filter(|r| is_open(r)).count(),
        })
    }
}

/// A bid the team is still chasing: the status mentions "bid", or the row
/// is flagged for follow-up.
pub fn is_active_bid(row: &Row) -> bool {
    let status_mentions_bid = row
        .status
        .as_deref()
        .is_some_and(|s| s.to_lowercase().contains("bid"));
    status_mentions_bid || row.follow_up == Some(true)
}

/// Job account still to be set up; an unresolved flag counts as pending.
pub fn is_job_account_pending(row: &Row) -> bool {
    !row.job_account.unwrap_or(false)
}

/// A record with no status at all is still open.
pub fn is_open(row: &Row) -> bool {
    match row.status.as_deref() {
        Some(status) => {
            let status = status.to_lowercase();
            !CLOSED_STATUS_WORDS
                .iter()
                .any(|word| status.contains(word))
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_status(status: Option<&str>) -> Row {
        Row {
            status: status.map(str::to_string),
            ..Row::default()
        }
    }

    #[test]
    fn test_open_counts_missing_status_as_open() {
        assert!(is_open(&row_with_status(None)));
        assert!(is_open(&row_with_status(Some("In Progress"))));
    }

    #[test]
    fn test_open_excludes_finished_statuses_any_case() {
        for status in ["Done", "done", "Closed", "Resolved", "Complete", "COMPLETED"] {
            assert!(!is_open(&row_with_status(Some(status))), "{status}");
        }
    }

    #[test]
    fn test_active_bid_matches_status_substring() {
        assert!(is_active_bid(&row_with_status(Some("Bid Sent"))));
        assert!(is_active_bid(&row_with_status(Some("rebid"))));
        assert!(!is_active_bid(&row_with_status(Some("In Progress"))));
        assert!(!is_active_bid(&row_with_status(None)));
    }

    #[test]
    fn test_follow_up_flag_makes_a_bid_active() {
        let row = Row {
            follow_up: Some(true),
            ..Row::default()
        };
        assert!(is_active_bid(&row));
    }

    #[test]
    fn test_job_account_pending_when_false_or_unresolved() {
        assert!(is_job_account_pending(&Row::default()));
        let pending = Row {
            job_account: Some(false),
            ..Row::default()
        };
        assert!(is_job_account_pending(&pending));
        let done = Row {
            job_account: Some(true),
            ..Row::default()
        };
        assert!(!is_job_account_pending(&done));
    }
}
