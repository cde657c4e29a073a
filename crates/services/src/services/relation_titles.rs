//! Resolves relation targets to display labels, memoized for the process
//! lifetime.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use dashmap::DashMap;
use futures::{StreamExt, TryStreamExt};
use notion::{NotionApiError, NotionClient};

use super::row_mapper::{Row, page_display_title};

/// Lookups in flight while labeling one page of rows.
const LOOKUP_CONCURRENCY: usize = 4;

#[derive(Clone)]
pub struct RelationTitleResolver {
    notion: NotionClient,
    cache: Arc<DashMap<String, String>>,
}

impl RelationTitleResolver {
    pub fn new(notion: NotionClient) -> Self {
        Self {
            notion,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Display label for one related record. Cached forever; relation
    /// targets (clients, mostly) rename rarely enough that a restart is an
    /// acceptable refresh.
    pub async fn resolve(&self, page_id: &str) -> Result<String, NotionApiError> {
        if let Some(hit) = self.cache.get(page_id) {
            return Ok(hit.clone());
        }

        let page = self.notion.retrieve_page(page_id).await?;
        let title = page_display_title(&page);
        self.cache.insert(page_id.to_string(), title.clone());
        Ok(title)
    }

    /// Fills every pending client label on the given rows, deduplicating
    /// targets and bounding lookup concurrency.
    pub async fn label_rows(&self, rows: &mut [Row]) -> Result<(), NotionApiError> {
        let targets: HashSet<String> = rows
            .iter()
            .filter_map(|r| r.client_relation.clone())
            .collect();
        if targets.is_empty() {
            return Ok(());
        }

        let titles: HashMap<String, String> = futures::stream::iter(targets)
            .map(|id| async move {
                let title = self.resolve(&id).await?;
                Ok::<_, NotionApiError>((id, title))
            })
            .buffer_unordered(LOOKUP_CONCURRENCY)
            .try_collect()
            .await?;

        for row in rows.iter_mut() {
            if let Some(id) = row.client_relation.take() {
                row.client = titles.get(&id).cloned();
            }
        }

        Ok(())
    }
}
