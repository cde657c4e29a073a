//! HTTP client for the Notion API.

use reqwest::{Client, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::types::{Database, Page, QueryRequest, QueryResponse};

const NOTION_API_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Clone, Error)]
pub enum NotionApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid integration token")]
    InvalidToken,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("json error: {0}")]
    Serde(String),
}

/// Notion API client. Calls are issued once, with no retry; failures
/// propagate to the caller immediately.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: Client,
    token: String,
}

impl NotionClient {
    pub fn new(token: String) -> Result<Self, NotionApiError> {
        let http = Client::builder()
            .user_agent(concat!("siteops-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotionApiError::Transport(e.to_string()))?;

        Ok(Self { http, token })
    }

    /// Fetch a database object, including its live property schema.
    pub async fn retrieve_database(&self, database_id: &str) -> Result<Database, NotionApiError> {
        self.get(&format!("databases/{database_id}")).await
    }

    /// One page of query results for a database.
    pub async fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse, NotionApiError> {
        self.post(&format!("databases/{database_id}/query"), request)
            .await
    }

    pub async fn retrieve_page(&self, page_id: &str) -> Result<Page, NotionApiError> {
        self.get(&format!("pages/{page_id}")).await
    }

    /// Create a page; `body` carries the parent pointer and properties.
    pub async fn create_page(&self, body: &Value) -> Result<Page, NotionApiError> {
        self.post("pages", body).await
    }

    /// Update properties on an existing page.
    pub async fn update_page(
        &self,
        page_id: &str,
        properties: Value,
    ) -> Result<Page, NotionApiError> {
        let body = serde_json::json!({ "properties": properties });
        self.patch(&format!("pages/{page_id}"), &body).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, NotionApiError> {
        let res = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode(res).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NotionApiError> {
        let res = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode(res).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NotionApiError> {
        let res = self
            .http
            .patch(self.url(path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode(res).await
    }

    fn url(&self, path: &str) -> String {
        format!("{NOTION_API_URL}/{path}")
    }

    async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, NotionApiError> {
        match res.status() {
            s if s.is_success() => res
                .json::<T>()
                .await
                .map_err(|e| NotionApiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(NotionApiError::InvalidToken),
            StatusCode::TOO_MANY_REQUESTS => Err(NotionApiError::RateLimited),
            StatusCode::NOT_FOUND => {
                let body = res.text().await.unwrap_or_default();
                Err(NotionApiError::NotFound(body))
            }
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(NotionApiError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> NotionApiError {
    if e.is_timeout() {
        NotionApiError::Timeout
    } else {
        NotionApiError::Transport(e.to_string())
    }
}
