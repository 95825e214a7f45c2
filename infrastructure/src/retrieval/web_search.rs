//! Web grounding via the DuckDuckGo Instant Answer API.
//!
//! The API needs no key and returns an abstract plus related topics rather
//! than a full result listing. Each becomes one [`ReferenceSnippet`]:
//!
//! | Field | Snippet text | Source | Section |
//! |-------|--------------|--------|---------|
//! | `AbstractText` | abstract | `AbstractURL` (or `AbstractSource`) | `abstract` |
//! | `RelatedTopics[].Text` | topic text | `FirstURL` | `related` |
//!
//! Nested topic groups (`{"Name", "Topics": [...]}`) are flattened.

use agora_application::{RetrievalPort, RetrievalRequest};
use agora_domain::ReferenceSnippet;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// DuckDuckGo Instant Answer API endpoint (no API key required).
const DDG_API_URL: &str = "https://api.duckduckgo.com/";

const USER_AGENT: &str = concat!("agora/", env!("CARGO_PKG_VERSION"), " (retrieval)");

/// [`RetrievalPort`] backed by DuckDuckGo.
///
/// Never fails: transport and parse errors are logged and yield no snippets.
pub struct WebSearchRetrieval {
    client: reqwest::Client,
    endpoint: String,
    region: String,
}

impl WebSearchRetrieval {
    pub fn new(region: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Could not build web search client, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            endpoint: DDG_API_URL.to_string(),
            region: region.into(),
        }
    }

    /// Point the adapter at a different endpoint (for mirrors and tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch(&self, query: &str) -> Result<Value, String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
                ("kl", self.region.as_str()),
            ])
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| format!("Search request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Search API returned error: {}", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| format!("Failed to parse search results: {}", e))
    }
}

/// Convert an Instant Answer response into snippets, best first.
fn snippets_from_response(data: &Value, max_results: usize) -> Vec<ReferenceSnippet> {
    let mut snippets = Vec::new();

    if let Some(text) = data["AbstractText"].as_str()
        && !text.is_empty()
    {
        let source = data["AbstractURL"]
            .as_str()
            .filter(|s| !s.is_empty())
            .or_else(|| data["AbstractSource"].as_str())
            .unwrap_or("duckduckgo");
        snippets.push(ReferenceSnippet::new(text, source).with_section("abstract"));
    }

    if let Some(topics) = data["RelatedTopics"].as_array() {
        let flattened = topics.iter().flat_map(|topic| match topic["Topics"].as_array() {
            Some(group) => group.iter().collect::<Vec<_>>(),
            None => vec![topic],
        });
        for topic in flattened {
            if let Some(text) = topic["Text"].as_str()
                && !text.is_empty()
            {
                let source = topic["FirstURL"].as_str().unwrap_or("duckduckgo");
                snippets.push(ReferenceSnippet::new(text, source).with_section("related"));
            }
        }
    }

    snippets.truncate(max_results);
    snippets
}

#[async_trait]
impl RetrievalPort for WebSearchRetrieval {
    async fn retrieve(&self, request: &RetrievalRequest) -> Vec<ReferenceSnippet> {
        if request.is_disabled() || request.query.trim().is_empty() {
            return Vec::new();
        }

        match self.fetch(&request.query).await {
            Ok(body) => {
                let snippets = snippets_from_response(&body, request.max_results);
                debug!(
                    session_id = %request.session_id,
                    role = %request.role,
                    found = snippets.len(),
                    "Web retrieval finished"
                );
                snippets
            }
            Err(e) => {
                warn!(
                    session_id = %request.session_id,
                    role = %request.role,
                    "Web retrieval failed, continuing without references: {}",
                    e
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::RoleId;
    use serde_json::json;

    fn request(max_results: usize) -> RetrievalRequest {
        RetrievalRequest {
            role: RoleId::rational(),
            query: "apartment commute".to_string(),
            max_results,
            session_id: "s".to_string(),
        }
    }

    #[test]
    fn test_snippets_from_response() {
        let data = json!({
            "AbstractText": "Seoul is the capital of South Korea.",
            "AbstractSource": "Wikipedia",
            "AbstractURL": "https://en.wikipedia.org/wiki/Seoul",
            "RelatedTopics": [
                {"Text": "Gangnam District - a district of Seoul", "FirstURL": "https://duckduckgo.com/Gangnam"},
                {"Name": "Transport", "Topics": [
                    {"Text": "Seoul Metropolitan Subway", "FirstURL": "https://duckduckgo.com/Subway"}
                ]},
                {"Text": "", "FirstURL": "https://duckduckgo.com/empty"}
            ]
        });

        let snippets = snippets_from_response(&data, 10);
        assert_eq!(snippets.len(), 3);
        assert_eq!(snippets[0].source_id, "https://en.wikipedia.org/wiki/Seoul");
        assert_eq!(snippets[0].section_label.as_deref(), Some("abstract"));
        assert_eq!(snippets[2].text, "Seoul Metropolitan Subway");
        assert_eq!(snippets[2].section_label.as_deref(), Some("related"));
    }

    #[test]
    fn test_snippets_respect_cap() {
        let data = json!({
            "RelatedTopics": [
                {"Text": "a", "FirstURL": "u1"},
                {"Text": "b", "FirstURL": "u2"},
                {"Text": "c", "FirstURL": "u3"}
            ]
        });
        assert_eq!(snippets_from_response(&data, 2).len(), 2);
    }

    #[test]
    fn test_empty_response_yields_nothing() {
        assert!(snippets_from_response(&json!({}), 5).is_empty());
    }

    #[tokio::test]
    async fn test_zero_cap_makes_no_call() {
        // Unroutable endpoint: a real call would fail, but none is made
        let retrieval = WebSearchRetrieval::new("wt-wt", Duration::from_millis(50))
            .with_endpoint("http://127.0.0.1:1/");
        assert!(retrieval.retrieve(&request(0)).await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty() {
        let retrieval = WebSearchRetrieval::new("wt-wt", Duration::from_millis(500))
            .with_endpoint("http://127.0.0.1:1/");
        assert!(retrieval.retrieve(&request(2)).await.is_empty());
    }
}
