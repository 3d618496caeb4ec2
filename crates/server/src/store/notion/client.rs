//! Notion REST API client.
//!
//! - Base URL: `https://api.notion.com/v1`
//! - Authentication: integration token via `Authorization: Bearer <token>`
//! - API Version: `2022-06-28` (specified via `Notion-Version` header)

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::NotionError;
use super::types::{ApiErrorBody, Database, Page, QueryRequest, QueryResponse, Sort};

/// Notion API version header value.
const NOTION_VERSION: &str = "2022-06-28";

/// Notion API base URL.
const BASE_URL: &str = "https://api.notion.com/v1";

/// Largest page size the query endpoint accepts.
const MAX_PAGE_SIZE: u8 = 100;

/// Thin client over the page and database endpoints used by the shift store.
#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    token: SecretString,
}

impl std::fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionClient")
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    /// Create a new client for the given integration token.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(token: SecretString) -> Result<Self, NotionError> {
        let mut headers = HeaderMap::new();
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, token })
    }

    /// Retrieve database metadata.
    ///
    /// # Errors
    ///
    /// Returns error if the database is missing, not shared with the
    /// integration, or the request fails.
    #[instrument(skip(self))]
    pub async fn retrieve_database(&self, database_id: &str) -> Result<Database, NotionError> {
        let response = self
            .client
            .get(format!("{BASE_URL}/databases/{database_id}"))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;
        handle_response(response, database_id).await
    }

    /// Query a database, following pagination until every page is read.
    ///
    /// # Errors
    ///
    /// Returns error if any page of results fails to load.
    #[instrument(skip(self, filter, sorts))]
    pub async fn query(
        &self,
        database_id: &str,
        filter: Option<Value>,
        sorts: Vec<Sort>,
    ) -> Result<Vec<Page>, NotionError> {
        let mut request = QueryRequest {
            filter,
            sorts,
            start_cursor: None,
            page_size: MAX_PAGE_SIZE,
        };
        let mut pages = Vec::new();

        loop {
            let response = self
                .client
                .post(format!("{BASE_URL}/databases/{database_id}/query"))
                .bearer_auth(self.token.expose_secret())
                .json(&request)
                .send()
                .await?;
            let batch: QueryResponse = handle_response(response, database_id).await?;
            pages.extend(batch.results);

            match batch.next_cursor {
                Some(cursor) if batch.has_more => request.start_cursor = Some(cursor),
                _ => break,
            }
        }

        debug!(count = pages.len(), "Notion database queried");
        Ok(pages)
    }

    /// Retrieve a single page.
    ///
    /// # Errors
    ///
    /// Returns `NotionError::NotFound` for unknown or malformed IDs.
    #[instrument(skip(self))]
    pub async fn retrieve_page(&self, page_id: &str) -> Result<Page, NotionError> {
        let response = self
            .client
            .get(page_url(page_id)?)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;
        handle_response(response, page_id).await
    }

    /// Update page properties and return the updated page.
    ///
    /// # Errors
    ///
    /// Returns error if the page is missing or Notion rejects the properties.
    #[instrument(skip(self, properties))]
    pub async fn update_page(&self, page_id: &str, properties: Value) -> Result<Page, NotionError> {
        let response = self
            .client
            .patch(page_url(page_id)?)
            .bearer_auth(self.token.expose_secret())
            .json(&serde_json::json!({ "properties": properties }))
            .send()
            .await?;
        handle_response(response, page_id).await
    }
}

/// Endpoint for one page. Page IDs are UUIDs, with or without hyphens;
/// anything else cannot name a page.
fn page_url(page_id: &str) -> Result<String, NotionError> {
    let id = uuid::Uuid::try_parse(page_id.trim())
        .map_err(|_| NotionError::NotFound(page_id.to_string()))?;
    Ok(format!("{BASE_URL}/pages/{id}"))
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    object_id: &str,
) -> Result<T, NotionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        warn!(retry_after, "Notion rate limit hit");
        return Err(NotionError::RateLimited(retry_after));
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(NotionError::NotFound(object_id.to_string()));
    }

    let body = response.json::<ApiErrorBody>().await.ok();
    let (code, message) = body.map_or_else(
        || ("unknown".to_string(), "Unknown error".to_string()),
        |b| (b.code, b.message),
    );
    Err(NotionError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_constants() {
        assert_eq!(BASE_URL, "https://api.notion.com/v1");
        assert_eq!(NOTION_VERSION, "2022-06-28");
    }

    #[test]
    fn test_page_url_accepts_notion_ids() {
        assert_eq!(
            page_url("1a2b3c4d5e6f47a8b9c0d1e2f3a4b5c6").unwrap(),
            "https://api.notion.com/v1/pages/1a2b3c4d-5e6f-47a8-b9c0-d1e2f3a4b5c6"
        );
        assert_eq!(
            page_url("1a2b3c4d-5e6f-47a8-b9c0-d1e2f3a4b5c6").unwrap(),
            "https://api.notion.com/v1/pages/1a2b3c4d-5e6f-47a8-b9c0-d1e2f3a4b5c6"
        );
    }

    #[test]
    fn test_page_url_rejects_other_paths() {
        for id in [
            "../databases/1a2b3c4d5e6f47a8b9c0d1e2f3a4b5c6",
            "1a2b3c4d5e6f47a8b9c0d1e2f3a4b5c6?filter=x",
            "1a2b3c4d5e6f47a8b9c0d1e2f3a4b5c6#frag",
            "demo-shift-3-1",
            "",
        ] {
            assert!(
                matches!(page_url(id), Err(NotionError::NotFound(_))),
                "{id} should not reach Notion"
            );
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = NotionClient::new(SecretString::from("secret_abc123")).unwrap_or_else(|e| {
            panic!("client should build: {e}");
        });
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret_abc123"));
    }
}
