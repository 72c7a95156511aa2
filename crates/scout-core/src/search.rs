use reqwest::Client;
use serde::Deserialize;

use crate::error::ExchangeError;

/// One ranked hit from the search provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    // Providers omit `items` entirely when nothing matched.
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Clone)]
pub struct SearchClient {
    client: Client,
    url: String,
}

impl SearchClient {
    pub fn new(url: &str) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run a query, returning results in the provider's ranking order.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ExchangeError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| ExchangeError::Search(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Search(format!("status {}: {}", status, text)));
        }

        let search_response: SearchResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::Search(format!("invalid response body: {}", e)))?;

        tracing::debug!(count = search_response.items.len(), "search returned results");
        Ok(search_response.items)
    }
}
