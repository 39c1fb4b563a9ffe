//! Authenticated org client with typed HTTP methods.
//!
//! `OrgClient` combines a session token with an HTTP client and provides
//! typed JSON methods for the Salesforce data API. The access token is
//! redacted in Debug output.

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::retry::RetryConfig;
use crate::DEFAULT_API_VERSION;

/// Which data API surface a request targets.
///
/// The tooling surface mirrors the standard REST resource layout under a
/// `tooling/` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiSurface {
    /// The standard REST data API.
    #[default]
    Rest,
    /// The Tooling API.
    Tooling,
}

impl ApiSurface {
    /// Path segment inserted after the version component.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            ApiSurface::Rest => "",
            ApiSurface::Tooling => "tooling/",
        }
    }
}

/// Authenticated client for one org.
///
/// # Example
///
/// ```rust,ignore
/// use sfmx_client::OrgClient;
///
/// let client = OrgClient::new("https://myorg.my.salesforce.com", "token")?;
/// let rows: Vec<serde_json::Value> = client
///     .query_all("SELECT Id FROM User LIMIT 5")
///     .await?;
/// ```
#[derive(Clone)]
pub struct OrgClient {
    http: reqwest::Client,
    instance_url: String,
    access_token: String,
    api_version: String,
    retry: Option<RetryConfig>,
}

impl std::fmt::Debug for OrgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl OrgClient {
    /// Create a new client with the given instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let instance_url = instance_url.into().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&instance_url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::new(ErrorKind::Config(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            ))));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            instance_url,
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            retry: config.retry,
        })
    }

    /// Set the API version (e.g., "60.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Build the full URL for a path.
    ///
    /// If the path starts with `/`, it's appended to the instance URL.
    /// Otherwise, it's assumed to be a full URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.instance_url, path)
        } else {
            format!("{}/{}", self.instance_url, path)
        }
    }

    /// Build a data API URL for a path on the given surface.
    ///
    /// Example: `data_url(ApiSurface::Tooling, "sobjects/")` ->
    /// `https://.../services/data/v60.0/tooling/sobjects/`
    pub fn data_url(&self, surface: ApiSurface, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/{}{}",
            self.instance_url,
            self.api_version,
            surface.path_prefix(),
            path
        )
    }

    /// GET request with JSON response deserialization.
    ///
    /// Retries retryable failures (timeouts, connection errors, 429/5xx)
    /// according to the configured retry policy. Accepts a path relative to
    /// the instance URL or a full URL.
    #[instrument(skip(self), fields(url = %path))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let Some(retry) = &self.retry else {
            return self.fetch_json(&url).await;
        };

        let mut attempt = 0;
        loop {
            match self.fetch_json(&url).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < retry.max_attempts => {
                    let delay = retry.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max = retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            return response.json::<T>().await.map_err(Into::into);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status, body = %body, "request failed");
        Err(error_from_response(status, &body))
    }

    /// Execute a SOQL query.
    ///
    /// Returns the first page of results. Use `query_all` for automatic
    /// pagination.
    ///
    /// User-provided values in the WHERE clause must be escaped with
    /// [`crate::security::soql::escape_string`] first.
    #[instrument(skip(self))]
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let encoded = urlencoding::encode(soql);
        let url = format!(
            "{}/services/data/v{}/query/?q={}",
            self.instance_url, self.api_version, encoded
        );
        self.get_json(&url).await
    }

    /// Execute a SOQL query and return all results (automatic pagination).
    #[instrument(skip(self))]
    pub async fn query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        let mut all_records = Vec::new();
        let mut result: QueryResult<T> = self.query(soql).await?;

        all_records.append(&mut result.records);

        while let Some(next_url) = result.next_records_url.take() {
            result = self.get_json(&next_url).await?;
            all_records.append(&mut result.records);
        }

        Ok(all_records)
    }
}

/// Result of a SOQL query.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct QueryResult<T> {
    /// Total number of records matching the query.
    #[serde(rename = "totalSize")]
    pub total_size: u64,

    /// Whether all records are returned (no more pages).
    pub done: bool,

    /// URL to fetch next batch of results.
    #[serde(rename = "nextRecordsUrl")]
    pub next_records_url: Option<String>,

    /// The records.
    pub records: Vec<T>,
}

/// One entry of a Salesforce JSON error body.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorEntry {
    message: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

/// Map an error response to a structured error.
///
/// Salesforce error bodies are a JSON array of `{message, errorCode}`
/// entries; the first entry carries the useful message.
fn error_from_response(status: u16, body: &str) -> Error {
    let entry = serde_json::from_str::<Vec<ApiErrorEntry>>(body)
        .ok()
        .and_then(|mut entries| if entries.is_empty() { None } else { Some(entries.remove(0)) });

    let message = entry
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| truncate(body, 200));

    let kind = match status {
        401 => ErrorKind::Authentication(if message.is_empty() {
            "session expired or invalid".to_string()
        } else {
            message
        }),
        403 => ErrorKind::Authorization(message),
        404 => ErrorKind::NotFound(message),
        _ => match entry.and_then(|e| e.error_code) {
            Some(error_code) => ErrorKind::Salesforce {
                error_code,
                message,
            },
            None => ErrorKind::Http { status, message },
        },
    };

    Error::new(kind)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
