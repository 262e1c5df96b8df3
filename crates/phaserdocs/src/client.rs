//! HTTP client for Phaser documentation access
//!
//! Wraps a pooled [`reqwest::Client`] with URL validation, exponential
//! backoff retries, and response security checks, and exposes the three
//! documentation operations: page fetch, catalog search, and API reference
//! lookup with fallback URLs.

use crate::config::DocsConfig;
use crate::error::DocsError;
use crate::parser;
use crate::search::{CatalogEntry, SearchIndex};
use crate::types::{clean_title, ApiReference, DocumentationPage, SearchResult, DEFAULT_TITLE};
use crate::validate::{sanitize_input, validate_search_query, UrlValidator};
use crate::DEFAULT_USER_AGENT;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::StatusCode;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Content types accepted without a warning
const ALLOWED_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml", "text/plain"];

/// Maximum response body size (1 MiB)
const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// Search results are capped at this many entries
const MAX_SEARCH_LIMIT: usize = 100;

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

/// A successfully fetched, security-validated response
#[derive(Debug)]
struct RawResponse {
    body: String,
    last_modified: Option<String>,
}

/// HTTP client for Phaser documentation sites
///
/// One instance owns one connection pool; construct it explicitly and pass
/// it where needed rather than sharing a global.
#[derive(Debug, Clone)]
pub struct DocsClient {
    http: reqwest::Client,
    validator: UrlValidator,
    index: SearchIndex,
    max_retries: u32,
    retry_delay: Duration,
}

impl DocsClient {
    /// Create a client from configuration with the default search catalog
    pub fn new(config: &DocsConfig) -> Result<Self, DocsError> {
        Self::with_catalog(config, crate::search::default_catalog())
    }

    /// Create a client with a custom search catalog
    pub fn with_catalog(
        config: &DocsConfig,
        catalog: Vec<CatalogEntry>,
    ) -> Result<Self, DocsError> {
        let validator = UrlValidator::new(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| DocsError::Network(format!("Failed to build HTTP client: {e}")))?;

        info!(base_url = %config.base_url, "Initialized documentation client");

        Ok(Self {
            http,
            validator,
            index: SearchIndex::new(catalog),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// Validator used for all URL inputs
    pub fn validator(&self) -> &UrlValidator {
        &self.validator
    }

    /// Backoff delay before the retry following failed attempt `attempt`
    /// (0-indexed): `retry_delay * 2^attempt`, no jitter
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.retry_delay * 2u32.saturating_pow(attempt)
    }

    /// Basic connectivity check: HEAD the base URL and accept 2xx/3xx
    pub async fn health_check(&self) -> Result<(), DocsError> {
        let url = format!("{}/", self.validator.base_url().as_str().trim_end_matches('/'));
        debug!(url = %url, "Performing health check");

        let response = self
            .http
            .head(&url)
            .send()
            .await
            .map_err(|e| DocsError::from_transport(&e))?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            debug!(status = status.as_u16(), "Health check passed");
            Ok(())
        } else {
            Err(DocsError::Http(format!(
                "Health check failed with status: {}",
                status.as_u16()
            )))
        }
    }

    /// Fetch a page as decoded HTML, with validation and retries
    pub async fn fetch_page(&self, url: &str) -> Result<String, DocsError> {
        let validated = self.validator.validate(url)?;
        info!(url = %validated, "Fetching page");

        let response = self.fetch_with_retry(&validated).await?;
        debug!(
            url = %validated,
            chars = response.body.len(),
            "Fetched page content"
        );
        Ok(response.body)
    }

    /// Fetch a page as a [`DocumentationPage`] value
    ///
    /// The content stays HTML at this stage; conversion to Markdown is the
    /// parser's job.
    pub async fn get_page_content(&self, url: &str) -> Result<DocumentationPage, DocsError> {
        let validated = self.validator.validate(url)?;
        let response = self.fetch_with_retry(&validated).await?;
        let title = extract_title(&response.body);

        let mut page = DocumentationPage::new(validated.as_str(), title, response.body, "text/html");
        page.last_modified = response.last_modified;
        Ok(page)
    }

    /// Search the static catalog for documentation pages
    ///
    /// `limit` is clamped to [1, 100]: values above 100 are capped with a
    /// warning, values below 1 are a validation error.
    pub fn search_content(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, DocsError> {
        let sanitized = validate_search_query(query)?;

        if limit < 1 {
            return Err(DocsError::Validation(
                "Limit must be a positive integer".to_string(),
            ));
        }
        let limit = if limit > MAX_SEARCH_LIMIT {
            warn!(requested = limit, "Search limit capped at {MAX_SEARCH_LIMIT}");
            MAX_SEARCH_LIMIT
        } else {
            limit
        };

        info!(query = %sanitized, limit, "Searching documentation");
        let results = self.index.search(&sanitized, limit);
        info!(count = results.len(), "Search completed");
        Ok(results)
    }

    /// Look up the API reference for a Phaser class
    ///
    /// Tries a fixed sequence of candidate URL patterns, moving on when a
    /// candidate 404s and aborting on any other HTTP failure. When every
    /// candidate 404s, returns a stub reference instead of an error.
    pub async fn get_api_reference(&self, class_name: &str) -> Result<ApiReference, DocsError> {
        let sanitized = sanitize_input(class_name);
        if sanitized.is_empty() {
            return Err(DocsError::Validation(
                "Class name is empty after sanitization".to_string(),
            ));
        }
        if !ApiReference::is_valid_class_name(&sanitized) {
            return Err(DocsError::Validation(
                "Class name contains invalid characters".to_string(),
            ));
        }

        let base = self.validator.base_url().as_str().trim_end_matches('/').to_string();
        let candidates = [
            format!("{base}/api/{sanitized}"),
            format!("{base}/api/Phaser.{sanitized}"),
            format!("{base}/api/Phaser.GameObjects.{sanitized}"),
            format!("{base}/api/Phaser.Scene.{sanitized}"),
        ];

        info!(class = %sanitized, "Fetching API reference");

        let mut found: Option<(String, String)> = None;
        for candidate in &candidates {
            match self.fetch_page(candidate).await {
                Ok(html) => {
                    debug!(url = %candidate, "Found API page");
                    found = Some((candidate.clone(), html));
                    break;
                }
                Err(DocsError::Http(msg)) if msg.starts_with("Page not found") => {
                    debug!(url = %candidate, "API page not found, trying next candidate");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        let Some((api_url, html)) = found else {
            warn!(class = %sanitized, "No API page found, returning stub reference");
            return Ok(ApiReference {
                class_name: sanitized.clone(),
                url: candidates[0].clone(),
                description: format!(
                    "API reference for {sanitized}. No specific documentation page found."
                ),
                ..Default::default()
            });
        };

        let api_ref = parser::extract_api_reference(&html, &sanitized, &api_url);
        info!(
            class = %sanitized,
            methods = api_ref.methods.len(),
            properties = api_ref.properties.len(),
            "Retrieved API reference"
        );
        Ok(api_ref)
    }

    /// GET a validated URL with exponential backoff
    ///
    /// Retryable: transport errors, 5xx, and 429 (up to `max_retries`
    /// retries). Non-retryable: other 4xx (immediate `Http`) and response
    /// security violations (immediate `Validation`).
    async fn fetch_with_retry(&self, url: &Url) -> Result<RawResponse, DocsError> {
        let mut last_error: Option<DocsError> = None;

        for attempt in 0..=self.max_retries {
            debug!(
                url = %url,
                attempt = attempt + 1,
                total = self.max_retries + 1,
                "Request attempt"
            );

            match self.http.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        if attempt < self.max_retries {
                            let wait = self.backoff_delay(attempt);
                            warn!(wait_ms = wait.as_millis() as u64, "Rate limited, backing off");
                            tokio::time::sleep(wait).await;
                            continue;
                        }
                        return Err(DocsError::RateLimit(format!(
                            "Rate limited after {} retries",
                            self.max_retries
                        )));
                    }

                    if status.is_server_error() {
                        last_error = Some(DocsError::Http(format!(
                            "HTTP error {}: {url}",
                            status.as_u16()
                        )));
                        if attempt < self.max_retries {
                            let wait = self.backoff_delay(attempt);
                            warn!(
                                status = status.as_u16(),
                                wait_ms = wait.as_millis() as u64,
                                "Server error, retrying"
                            );
                            tokio::time::sleep(wait).await;
                            continue;
                        }
                        break;
                    }

                    if status.is_client_error() {
                        // Client errors are never retried
                        return Err(match status {
                            StatusCode::NOT_FOUND => {
                                DocsError::Http(format!("Page not found: {url}"))
                            }
                            StatusCode::FORBIDDEN => {
                                DocsError::Http(format!("Access forbidden: {url}"))
                            }
                            other => DocsError::Http(format!(
                                "Client error {}: {url}",
                                other.as_u16()
                            )),
                        });
                    }

                    // 2xx/3xx: validate and return; Validation propagates
                    // without consuming further retries
                    return self.validate_response(response).await;
                }
                Err(e) => {
                    let wrapped = DocsError::from_transport(&e);
                    if attempt < self.max_retries {
                        let wait = self.backoff_delay(attempt);
                        warn!(error = %wrapped, wait_ms = wait.as_millis() as u64, "Transport failure, retrying");
                        last_error = Some(wrapped);
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    last_error = Some(wrapped);
                    break;
                }
            }
        }

        error!(url = %url, attempts = self.max_retries + 1, "All attempts failed");
        Err(last_error.unwrap_or_else(|| {
            DocsError::Network(format!(
                "Request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }

    /// Enforce the response security policy
    ///
    /// Unexpected content types only warn; size violations (declared or
    /// actual) are a hard validation failure.
    async fn validate_response(&self, response: reqwest::Response) -> Result<RawResponse, DocsError> {
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(';').next().unwrap_or("").trim().to_lowercase());

        if let Some(ref ct) = content_type {
            if !ALLOWED_CONTENT_TYPES.contains(&ct.as_str()) {
                warn!(content_type = %ct, url = %response.url(), "Unexpected content type");
            }
        }

        if let Some(declared) = response.content_length() {
            if declared as usize > MAX_RESPONSE_SIZE {
                return Err(DocsError::Validation(format!(
                    "Response too large: {declared} bytes (max: {MAX_RESPONSE_SIZE})"
                )));
            }
        }

        let last_modified = response
            .headers()
            .get("last-modified")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DocsError::from_transport(&e))?;

        if bytes.len() > MAX_RESPONSE_SIZE {
            return Err(DocsError::Validation(format!(
                "Response content too large: {} bytes (max: {MAX_RESPONSE_SIZE})",
                bytes.len()
            )));
        }

        Ok(RawResponse {
            body: String::from_utf8_lossy(&bytes).into_owned(),
            last_modified,
        })
    }
}

/// Extract a page title from raw HTML via the `<title>` tag
///
/// Fallback used before the full parser runs; returns the default title
/// when no tag is present.
pub(crate) fn extract_title(html: &str) -> String {
    if let Some(captures) = TITLE_TAG.captures(html) {
        let raw = captures.get(1).map(|m| m.as_str()).unwrap_or("");
        let title = clean_title(raw);
        if !title.is_empty() {
            return title;
        }
    }
    DEFAULT_TITLE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with(max_retries: u32, retry_delay_ms: u64) -> DocsClient {
        let config = DocsConfig::default()
            .with_max_retries(max_retries)
            .with_retry_delay(Duration::from_millis(retry_delay_ms));
        DocsClient::new(&config).unwrap()
    }

    #[test]
    fn test_backoff_is_pure_exponential() {
        let client = client_with(3, 1000);
        assert_eq!(client.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(client.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(client.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(client.backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("<html><head><title>Scenes - Phaser</title></head></html>"),
            "Scenes"
        );
        assert_eq!(
            extract_title("<TITLE>Multi\n  line   title</TITLE>"),
            "Multi line title"
        );
        assert_eq!(extract_title("<p>no title here</p>"), DEFAULT_TITLE);
    }

    #[test]
    fn test_search_limit_below_one_rejected() {
        let client = client_with(0, 1);
        assert!(matches!(
            client.search_content("sprite", 0),
            Err(DocsError::Validation(_))
        ));
    }

    #[test]
    fn test_search_rejects_injection() {
        let client = client_with(0, 1);
        assert!(client.search_content("<script>alert(1)</script>", 5).is_err());
    }

    #[tokio::test]
    async fn test_api_reference_rejects_bad_class_name() {
        let client = client_with(0, 1);
        let result = client.get_api_reference("Sprite;drop table").await;
        assert!(matches!(result, Err(DocsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_foreign_domain() {
        let client = client_with(0, 1);
        let result = client.fetch_page("https://evil.com/docs").await;
        assert!(matches!(result, Err(DocsError::Validation(_))));
    }
}
