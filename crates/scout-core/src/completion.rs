use std::time::Duration;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;

use crate::error::{DecodeError, ExchangeError};
use crate::stream::{decode, Fragment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<PromptMessage>,
    pub stream: bool,
}

pub type FragmentStream = BoxStream<'static, Result<Fragment, DecodeError>>;

#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    url: String,
    model: Option<String>,
    idle_timeout: Duration,
}

impl CompletionClient {
    pub fn new(url: &str) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            model: None,
            idle_timeout: Duration::from_secs(60),
        }
    }

    pub fn model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Start a streaming completion.
    ///
    /// Only failures before the body starts are returned here; anything that
    /// goes wrong mid-stream arrives as an error item on the returned stream.
    pub async fn stream(
        &self,
        messages: Vec<PromptMessage>,
    ) -> Result<FragmentStream, ExchangeError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            stream: true,
        };

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| ExchangeError::CompletionStart(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ExchangeError::CompletionStart(format!(
                "status {}: {}",
                status, text
            )));
        }

        Ok(decode(response.bytes_stream(), self.idle_timeout).boxed())
    }
}
