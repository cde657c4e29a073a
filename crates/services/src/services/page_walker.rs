//! Cursor pagination over database query results.

use std::future::Future;

use notion::{NotionApiError, NotionClient, Page, QueryRequest, QueryResponse};
use serde_json::Value;
use tracing::warn;

/// Hard cap on pages walked per query. Purely a runaway safety valve; a
/// result set that legitimately exceeds it comes back silently truncated.
pub const MAX_QUERY_PAGES: usize = 20;

const QUERY_PAGE_SIZE: u32 = 100;

/// Follows continuation cursors until the store reports no further pages,
/// concatenating results in the order the store returned them.
pub async fn collect_paged<F, Fut>(mut fetch: F) -> Result<Vec<Page>, NotionApiError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<QueryResponse, NotionApiError>>,
{
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages_walked = 0usize;

    loop {
        let response = fetch(cursor.take()).await?;
        pages_walked += 1;
        records.extend(response.results);

        match response.next_cursor.filter(|_| response.has_more) {
            Some(next) if pages_walked < MAX_QUERY_PAGES => cursor = Some(next),
            Some(_) => {
                warn!(
                    pages = pages_walked,
                    records = records.len(),
                    "query page cap reached, returning truncated result"
                );
                break;
            }
            None => break,
        }
    }

    Ok(records)
}

/// Queries a database and walks every result page.
pub async fn collect_all(
    notion: &NotionClient,
    database_id: &str,
    filter: Option<Value>,
    sorts: Vec<Value>,
) -> Result<Vec<Page>, NotionApiError> {
    collect_paged(|start_cursor| {
        let request = QueryRequest {
            filter: filter.clone(),
            sorts: sorts.clone(),
            start_cursor,
            page_size: Some(QUERY_PAGE_SIZE),
        };
        async move { notion.query_database(database_id, &request).await }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str) -> Page {
        Page {
            id: id.to_string(),
            ..Page::default()
        }
    }

    fn batch(prefix: &str, count: usize) -> Vec<Page> {
        (0..count).map(|i| page(&format!("{prefix}-{i}"))).collect()
    }

    #[tokio::test]
    async fn test_collects_all_pages_in_order() {
        let records = collect_paged(|cursor| {
            let response = match cursor.as_deref() {
                None => QueryResponse {
                    results: batch("a", 100),
                    has_more: true,
                    next_cursor: Some("c1".to_string()),
                },
                Some("c1") => QueryResponse {
                    results: batch("b", 100),
                    has_more: true,
                    next_cursor: Some("c2".to_string()),
                },
                Some("c2") => QueryResponse {
                    results: batch("c", 37),
                    has_more: false,
                    next_cursor: None,
                },
                other => panic!("unexpected cursor {other:?}"),
            };
            async move { Ok(response) }
        })
        .await
        .unwrap();

        assert_eq!(records.len(), 237);
        assert_eq!(records.first().unwrap().id, "a-0");
        assert_eq!(records[100].id, "b-0");
        assert_eq!(records.last().unwrap().id, "c-36");
    }

    #[tokio::test]
    async fn test_page_cap_stops_runaway_cursor_chains() {
        let mut calls = 0usize;
        let records = collect_paged(|_| {
            calls += 1;
            let response = QueryResponse {
                results: batch("p", 10),
                has_more: true,
                next_cursor: Some("again".to_string()),
            };
            async move { Ok(response) }
        })
        .await
        .unwrap();

        assert_eq!(calls, MAX_QUERY_PAGES);
        assert_eq!(records.len(), MAX_QUERY_PAGES * 10);
    }

    #[tokio::test]
    async fn test_errors_propagate_immediately() {
        let result = collect_paged(|_| async {
            Err::<QueryResponse, _>(NotionApiError::RateLimited)
        })
        .await;
        assert!(matches!(result, Err(NotionApiError::RateLimited)));
    }

    #[tokio::test]
    async fn test_missing_cursor_ends_the_walk() {
        // A store that claims more pages but returns no cursor must not
        // loop back to the first page.
        let mut calls = 0usize;
        let records = collect_paged(|_| {
            calls += 1;
            let response = QueryResponse {
                results: batch("x", 5),
                has_more: true,
                next_cursor: None,
            };
            async move { Ok(response) }
        })
        .await
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(records.len(), 5);
    }
}
