#![doc = "Publisher integration for CLI and core: bridges the trait abstraction to the Notion REST API."]
//
//! # Notion client
//!
//! [`NotionClient`] implements the core [`Publisher`] trait over reqwest.
//!
//! - Authenticates with `Authorization: Bearer <token>` and pins the API
//!   version with the `Notion-Version` header.
//! - Follows `has_more`/`next_cursor` pagination when listing children.
//! - Retries `429 Too Many Requests` and `5xx` responses, honouring
//!   `Retry-After` when present and otherwise backing off exponentially.
//!   Every wait is capped at `max_retry_delay_ms`.
//!
//! The token is marked sensitive in the header map and is never logged.

use std::time::Duration;

use async_trait::async_trait;
use notion_docs_sync_core::contract::{PublishError, Publisher, RemoteBlock, RemotePage};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use crate::load_config::ApiSection;

const PAGE_SIZE: &str = "100";

pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_base_delay: Duration,
    max_retry_delay: Duration,
}

impl NotionClient {
    pub fn new(token: &str, api: &ApiSection) -> Result<Self, PublishError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| PublishError::Other("token contains invalid header characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            "Notion-Version",
            HeaderValue::from_str(&api.notion_version).map_err(|e| {
                PublishError::Other(format!("invalid notion_version {:?}: {e}", api.notion_version))
            })?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| PublishError::Http(e.to_string()))?;

        tracing::info!(
            token_set = !token.is_empty(),
            base_url = %api.base_url,
            notion_version = %api.notion_version,
            "Initialized NotionClient"
        );
        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            max_retries: api.max_retries,
            retry_base_delay: Duration::from_millis(api.retry_base_delay_ms),
            max_retry_delay: Duration::from_millis(api.max_retry_delay_ms),
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_retry_delay)
    }

    /// Send a request, retrying rate limits and server errors, and decode
    /// the JSON response body.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, PublishError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            let mut request = self.http.request(method.clone(), &url).query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(error = %e, attempt, ?delay, url = %url, "Transport error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, url = %url, "Request to Notion failed");
                    return Err(PublishError::Http(e.to_string()));
                }
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<Value>()
                    .await
                    .map_err(|e| PublishError::Decode(e.to_string()));
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < self.max_retries {
                let delay = retry_after(response.headers())
                    .map(|delay| delay.min(self.max_retry_delay))
                    .unwrap_or_else(|| self.backoff(attempt));
                tracing::warn!(%status, attempt, ?delay, url = %url, "Notion asked us to back off, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            tracing::error!(%status, url = %url, body = %text, "Notion API returned an error");
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(PublishError::RateLimited {
                    attempts: attempt + 1,
                });
            }
            return Err(PublishError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
    }
}

/// `Retry-After` in seconds. Values too large for a [`Duration`] saturate.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| !secs.is_nan() && *secs >= 0.0)
        .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}

/// Decode one API block object.
fn remote_block(value: &Value) -> Result<RemoteBlock, PublishError> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| PublishError::Decode(format!("block without id: {value}")))?;
    let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
    let body = value.get(kind);

    let child_page_title = if kind == "child_page" {
        body.and_then(|b| b.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string)
    } else {
        None
    };

    Ok(RemoteBlock {
        id: id.to_string(),
        kind: kind.to_string(),
        has_children: value
            .get("has_children")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        body: body.cloned().unwrap_or(Value::Null),
        child_page_title,
    })
}

fn results(response: &Value) -> Result<Vec<RemoteBlock>, PublishError> {
    response
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| PublishError::Decode("response has no results array".into()))?
        .iter()
        .map(remote_block)
        .collect()
}

#[async_trait]
impl Publisher for NotionClient {
    async fn list_children(&self, block_id: &str) -> Result<Vec<RemoteBlock>, PublishError> {
        tracing::debug!(block_id, "Listing block children");
        let path = format!("/v1/blocks/{block_id}/children");
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("page_size", PAGE_SIZE)];
            if let Some(cursor) = cursor.as_deref() {
                query.push(("start_cursor", cursor));
            }
            let response = self.execute(Method::GET, &path, &query, None).await?;
            blocks.extend(results(&response)?);

            let has_more = response
                .get("has_more")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let next = response
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);

            match next {
                Some(next) if has_more => {
                    if cursor.as_deref() == Some(next.as_str()) {
                        return Err(PublishError::Decode(format!(
                            "pagination cursor {next} repeated"
                        )));
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        tracing::debug!(block_id, count = blocks.len(), "Listed block children");
        Ok(blocks)
    }

    async fn create_page(&self, parent_id: &str, title: &str) -> Result<RemotePage, PublishError> {
        tracing::info!(parent_id, title, "Creating page");
        let body = json!({
            "parent": { "page_id": parent_id },
            "properties": {
                "title": {
                    "title": [{ "type": "text", "text": { "content": title } }]
                }
            }
        });
        let response = self
            .execute(Method::POST, "/v1/pages", &[], Some(&body))
            .await?;
        let id = response
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| PublishError::Decode("created page has no id".into()))?;
        tracing::info!(page_id = id, title, "Successfully created page");
        Ok(RemotePage { id: id.to_string() })
    }

    async fn append_children(
        &self,
        block_id: &str,
        children: Vec<Value>,
    ) -> Result<Vec<RemoteBlock>, PublishError> {
        tracing::info!(block_id, count = children.len(), "Appending blocks");
        let path = format!("/v1/blocks/{block_id}/children");
        let body = json!({ "children": children });
        let response = self
            .execute(Method::PATCH, &path, &[], Some(&body))
            .await?;
        results(&response)
    }

    async fn delete_block(&self, block_id: &str) -> Result<(), PublishError> {
        tracing::debug!(block_id, "Deleting block");
        let path = format!("/v1/blocks/{block_id}");
        self.execute(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }
}
