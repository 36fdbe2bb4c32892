//! Wikipedia adapter for the knowledge-lookup port.
//!
//! Queries the MediaWiki search API and condenses the top hits into a short
//! text summary. The result count is capped to keep agent observations
//! small.

use docqa_core::{AppError, AppResult};
use docqa_workflow::Knowledge;
use serde::Deserialize;

/// Default MediaWiki API endpoint (English Wikipedia).
const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Number of search hits folded into one summary.
const RESULT_LIMIT: usize = 3;

/// Sentinel summary when the search finds nothing.
pub const NO_RESULTS_SENTINEL: &str = "No results found.";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Wikipedia search client implementing the [`Knowledge`] port.
pub struct WikipediaClient {
    endpoint: String,
    client: reqwest::Client,
}

impl WikipediaClient {
    /// Create a client against the default English Wikipedia endpoint.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom MediaWiki endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Knowledge for WikipediaClient {
    async fn search(&self, query: &str) -> AppResult<String> {
        tracing::info!("Searching Wikipedia");
        tracing::debug!("Query: {}", query);

        let limit = RESULT_LIMIT.to_string();
        let params = [
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", limit.as_str()),
            ("format", "json"),
            ("utf8", "1"),
        ];

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Wikipedia request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Knowledge(format!(
                "Wikipedia API error: {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse Wikipedia response: {}", e)))?;

        let hits = parsed.query.map(|q| q.search).unwrap_or_default();
        tracing::debug!("Wikipedia returned {} hit(s)", hits.len());

        Ok(summarize(&hits))
    }
}

/// Fold search hits into a short plain-text summary.
fn summarize(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS_SENTINEL.to_string();
    }

    hits.iter()
        .take(RESULT_LIMIT)
        .map(|hit| format!("{}: {}", hit.title, strip_markup(&hit.snippet)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip HTML tags and the handful of entities the search API emits.
fn strip_markup(snippet: &str) -> String {
    let mut out = String::with_capacity(snippet.len());
    let mut in_tag = false;

    for c in snippet.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}
