pub mod conditional_access;
pub mod directory;

use crate::config::{ConfigManager, GraphSettings};
use crate::error::{CavizError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// +/- 30% jitter
const JITTER_FACTOR: f64 = 0.3;

/// Calculate exponential backoff with jitter for the given attempt
fn calculate_backoff_with_jitter(attempt: u32, settings: &GraphSettings) -> Duration {
    let base_backoff = settings
        .initial_backoff_ms
        .saturating_mul(2u64.saturating_pow(attempt));
    let capped_backoff = base_backoff.min(settings.max_backoff_ms);

    let jitter_range = (capped_backoff as f64 * JITTER_FACTOR) as u64;
    let jitter = if jitter_range > 0 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        std::time::SystemTime::now().hash(&mut hasher);
        (hasher.finish() % (jitter_range * 2)) as i64 - jitter_range as i64
    } else {
        0
    };

    Duration::from_millis((capped_backoff as i64 + jitter).max(0) as u64)
}

/// Read-only Microsoft Graph client with retry support
pub struct GraphClient {
    client: Client,
    access_token: String,
    settings: GraphSettings,
}

impl GraphClient {
    pub fn new(access_token: String) -> Result<Self> {
        Self::with_settings(access_token, GraphSettings::default())
    }

    pub fn with_settings(access_token: String, settings: GraphSettings) -> Result<Self> {
        settings.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            access_token,
            settings,
        })
    }

    /// Create a GraphClient from the config file and a resolved access token
    pub fn from_config(config: &ConfigManager, token: Option<&str>) -> Result<Self> {
        let access_token = config.resolve_token(token)?;
        let settings = config.load_config()?.graph;
        Self::with_settings(access_token, settings)
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// GET an endpoint relative to the configured base URL
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T> {
        self.get_raw_url(&self.endpoint_url(endpoint)).await
    }

    /// GET an absolute URL, retrying on throttling, server errors and connection failures
    async fn get_raw_url<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let max_retries = self.settings.max_retries;
        let mut last_error = None;

        for attempt in 0..max_retries {
            tracing::debug!("GET {} (attempt {}/{})", url, attempt + 1, max_retries);

            let response = self
                .client
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS && attempt < max_retries - 1 {
                        let retry_after = resp
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(self.settings.initial_backoff_ms / 1000);

                        tracing::warn!(
                            "Rate limited (429). Retrying in {} seconds... (attempt {}/{})",
                            retry_after,
                            attempt + 1,
                            max_retries
                        );
                        tokio::time::sleep(Duration::from_secs(retry_after)).await;
                        continue;
                    }

                    if status.is_server_error() && attempt < max_retries - 1 {
                        let wait_time = calculate_backoff_with_jitter(attempt, &self.settings);
                        tracing::warn!(
                            "Server error ({}). Retrying in {:?}... (attempt {}/{})",
                            status,
                            wait_time,
                            attempt + 1,
                            max_retries
                        );
                        tokio::time::sleep(wait_time).await;
                        continue;
                    }

                    if !status.is_success() {
                        let error_text = resp.text().await.unwrap_or_default();
                        let enhanced_error = crate::error::enhance_graph_error(&error_text);
                        return Err(CavizError::GraphApiError(format!(
                            "HTTP {}: {}",
                            status, enhanced_error
                        )));
                    }

                    return Ok(resp.json::<T>().await?);
                }
                Err(e) => {
                    if attempt < max_retries - 1 {
                        let wait_time = calculate_backoff_with_jitter(attempt, &self.settings);
                        tracing::warn!(
                            "Connection error: {}. Retrying in {:?}... (attempt {}/{})",
                            e,
                            wait_time,
                            attempt + 1,
                            max_retries
                        );
                        tokio::time::sleep(wait_time).await;
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.map(|e| e.into()).unwrap_or_else(|| {
            CavizError::GraphApiError(format!("GET {} failed after {} retries", url, max_retries))
        }))
    }
}

// ============================================================================
// Pagination Helpers
// ============================================================================

/// Standard OData collection page with `value` and `@odata.nextLink`
#[derive(Debug, Deserialize)]
pub struct PaginatedResponse<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

impl GraphClient {
    /// Fetch all pages of a collection endpoint
    ///
    /// Follows `@odata.nextLink` until the last page. Each link is an absolute
    /// URL and is requested as-is.
    pub async fn get_all_pages<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<Vec<T>> {
        self.get_pages_limited(endpoint, 0).await
    }

    /// Fetch at most `max_pages` pages (0 = unlimited)
    pub async fn get_pages_limited<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        max_pages: usize,
    ) -> Result<Vec<T>> {
        let mut all_items: Vec<T> = Vec::new();
        let mut current_url = self.endpoint_url(endpoint);
        let mut page_count = 0;

        loop {
            let response: PaginatedResponse<T> = self.get_raw_url(&current_url).await?;
            all_items.extend(response.value);
            page_count += 1;

            if max_pages > 0 && page_count >= max_pages {
                break;
            }

            match response.next_link {
                Some(next) => current_url = next,
                None => break,
            }
        }

        tracing::debug!(
            "Fetched {} items over {} page(s) from {}",
            all_items.len(),
            page_count,
            endpoint
        );

        Ok(all_items)
    }
}
