use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};

/// One parameter of a REST query, e.g. `("is_deleted", "eq.false")`.
pub type QueryParam = (String, String);

/// Thin client for the hosted store's REST surface. Speaks PostgREST
/// conventions: filter operators in query parameters, `Range` headers
/// for paging, `Prefer` for mutation result shape.
#[derive(Clone)]
pub struct StoreClient {
    http: Client,
    base: Url,
    api_key: String,
    table: String,
}

impl StoreClient {
    pub fn new(config: &Config) -> Result<Self> {
        if config.backend_url.is_empty() || config.api_key.is_empty() {
            return Err(AppError::Config(format!(
                "backend_url and api_key must be set in {}",
                Config::config_path().display()
            )));
        }

        let base = Url::parse(&config.backend_url)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("article-shelf/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            http,
            base,
            api_key: config.api_key.clone(),
            table: config.table_name.clone(),
        })
    }

    /// Build a client and verify the store is reachable with a count
    /// probe. Callers that must start with a live connection use this;
    /// the background worker uses `new` and lets the connection monitor
    /// drive reconnection instead.
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = Self::new(config)?;
        let total = client.probe().await?;
        tracing::info!("connected to article store ({total} rows)");
        Ok(client)
    }

    /// Lightweight connectivity check: an exact count over the table.
    pub async fn probe(&self) -> Result<u64> {
        self.count(&[]).await
    }

    fn endpoint(&self) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("backend_url cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["rest", "v1", &self.table]);
        Ok(url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn expect_success(response: Response) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(AppError::Backend(format!("{status}: {error_text}")));
        }
        Ok(response)
    }

    /// `GET {base}/rest/v1/{table}?{params}`, optionally with an
    /// inclusive item range for paging.
    pub async fn select<T: DeserializeOwned>(
        &self,
        params: &[QueryParam],
        range: Option<(u64, u64)>,
    ) -> Result<Vec<T>> {
        let mut url = self.endpoint()?;
        url.set_query(Some(&query_string(params)));

        let mut request = self.authed(self.http.get(url));
        if let Some((start, end)) = range {
            request = request
                .header("Range-Unit", "items")
                .header("Range", format!("{start}-{end}"));
        }

        let response = Self::expect_success(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Exact row count for the given predicate, taken from the
    /// `Content-Range` header rather than the body.
    pub async fn count(&self, params: &[QueryParam]) -> Result<u64> {
        let mut all = params.to_vec();
        all.push(("select".to_string(), "id".to_string()));
        all.push(("limit".to_string(), "1".to_string()));

        let mut url = self.endpoint()?;
        url.set_query(Some(&query_string(&all)));

        let response = self
            .authed(self.http.get(url))
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::expect_success(response).await?;

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| AppError::Backend("missing count in Content-Range".to_string()))
    }

    async fn patch(&self, id: i64, body: &serde_json::Value, prefer: &str) -> Result<Response> {
        let mut url = self.endpoint()?;
        url.set_query(Some(&query_string(&[(
            "id".to_string(),
            format!("eq.{id}"),
        )])));

        let response = self
            .authed(self.http.patch(url))
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// `PATCH {base}/rest/v1/{table}?id=eq.{id}` returning the updated rows.
    pub async fn patch_returning<T: DeserializeOwned>(
        &self,
        id: i64,
        body: &serde_json::Value,
    ) -> Result<Vec<T>> {
        let response = self.patch(id, body, "return=representation").await?;
        Ok(response.json().await?)
    }

    /// Same PATCH with `return=minimal`; only success matters.
    pub async fn patch_minimal(&self, id: i64, body: &serde_json::Value) -> Result<()> {
        self.patch(id, body, "return=minimal").await?;
        Ok(())
    }
}

fn query_string(params: &[QueryParam]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse the total out of a `Content-Range` header: `0-0/42` or `*/0`.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

/// Where the change feed last observed the table: row count plus the
/// most recent `updated_at`. Any mutation moves at least one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeCursor {
    pub total: u64,
    pub latest: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UpdatedAtRow {
    updated_at: DateTime<Utc>,
}

/// Change-subscription primitive over the store: a polling cursor that
/// yields `Some` whenever the observed cursor moves. The first poll
/// yields the initial snapshot. Faults are returned to the caller,
/// which owns the restart policy.
pub struct ChangeFeed {
    client: StoreClient,
    cursor: Option<ChangeCursor>,
}

impl ChangeFeed {
    pub fn new(client: StoreClient) -> Self {
        Self {
            client,
            cursor: None,
        }
    }

    /// Drop the observed cursor, so the next poll re-baselines. Used
    /// when the feed is rebuilt after a fault.
    pub fn reset(&mut self) {
        self.cursor = None;
    }

    pub async fn poll(&mut self) -> Result<Option<ChangeCursor>> {
        let next = self
            .observe()
            .await
            .map_err(|e| AppError::Subscription(e.to_string()))?;

        if self.cursor.as_ref() == Some(&next) {
            return Ok(None);
        }
        self.cursor = Some(next.clone());
        Ok(Some(next))
    }

    async fn observe(&self) -> Result<ChangeCursor> {
        let total = self.client.count(&[]).await?;
        let rows: Vec<UpdatedAtRow> = self
            .client
            .select(
                &[
                    ("select".to_string(), "updated_at".to_string()),
                    ("order".to_string(), "updated_at.desc".to_string()),
                    ("limit".to_string(), "1".to_string()),
                ],
                None,
            )
            .await?;

        Ok(ChangeCursor {
            total,
            latest: rows.first().map(|r| r.updated_at),
        })
    }
}
