//! MediaWiki API client.

use super::Encyclopedia;
use crate::config::WikipediaSettings;
use crate::error::{DelveError, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

/// Returned when a search produces no usable page.
pub const NO_RESULTS: &str = "No good Wikipedia Search Result was found";

/// Wikipedia client that returns truncated page introductions.
pub struct WikipediaClient {
    client: reqwest::Client,
    endpoint: String,
    top_k_results: usize,
    doc_content_chars_max: usize,
    max_query_length: usize,
}

impl WikipediaClient {
    /// Create a client from settings.
    pub fn new(settings: &WikipediaSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint(),
            top_k_results: settings.top_k_results,
            doc_content_chars_max: settings.doc_content_chars_max,
            max_query_length: settings.max_query_length,
        })
    }

    /// Search for page titles matching the query.
    async fn search_titles(&self, query: &str) -> Result<Vec<String>> {
        let limit = self.top_k_results.to_string();
        let body = self
            .get(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("utf8", "1"),
            ])
            .await?;

        let titles = body["query"]["search"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| r["title"].as_str().map(|s| s.to_string()))
                    .take(self.top_k_results)
                    .collect()
            })
            .unwrap_or_default();

        Ok(titles)
    }

    /// Fetch the plain-text introduction of a page. `None` if the page is missing.
    async fn page_summary(&self, title: &str) -> Result<Option<String>> {
        let body = self
            .get(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;

        let page = &body["query"]["pages"][0];
        if page.is_null() || page["missing"].as_bool().unwrap_or(false) {
            return Ok(None);
        }

        Ok(page["extract"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<Value> {
        let url = url::Url::parse_with_params(&self.endpoint, params)
            .map_err(|e| DelveError::Wikipedia(format!("Invalid endpoint {}: {}", self.endpoint, e)))?;

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DelveError::Wikipedia(format!("HTTP {}", status.as_u16())));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    #[instrument(skip(self))]
    async fn lookup(&self, query: &str) -> Result<String> {
        let query = truncate_chars(query.trim(), self.max_query_length);
        if query.is_empty() {
            return Err(DelveError::InvalidInput("Wikipedia query is empty".to_string()));
        }

        let titles = self.search_titles(&query).await?;
        debug!("Wikipedia search returned {} titles", titles.len());

        let mut pages = Vec::with_capacity(titles.len());
        for title in titles {
            if let Some(summary) = self.page_summary(&title).await? {
                pages.push((title, summary));
            }
        }

        if pages.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        Ok(truncate_chars(&format_pages(&pages), self.doc_content_chars_max))
    }
}

/// Render pages as `Page: <title>\nSummary: <summary>` blocks separated by a blank line.
pub fn format_pages(pages: &[(String, String)]) -> String {
    pages
        .iter()
        .map(|(title, summary)| format!("Page: {}\nSummary: {}", title, summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Keep at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
