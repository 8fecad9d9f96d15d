//! Transport seam between the critique client and the remote endpoint.
//!
//! The retry loop in [`crate::critique::CritiqueClient`] only sees this trait,
//! so tests can script failures without a network.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::CritiqueConfig;
use crate::critique::request::{GenerateContentRequest, GenerateContentResponse};
use crate::error::{HarmonyError, HarmonyResult};

/// Upper bound on how much of an error body is kept in a `Transport` error.
const ERROR_BODY_LIMIT: usize = 512;

/// Sends one `generateContent` request and returns the decoded envelope.
///
/// Implementations classify failures as `Transport` (non-success status),
/// `Network` (no status) or `SchemaParse` (envelope is not valid JSON). They
/// must not retry; retrying is the client's job.
#[async_trait]
pub trait CritiqueTransport: Send + Sync {
    async fn generate(&self, request: &GenerateContentRequest) -> HarmonyResult<GenerateContentResponse>;
}

/// HTTPS transport backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: &CritiqueConfig) -> HarmonyResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HarmonyError::network_with_source("build http client", e))?;
        Ok(Self {
            client,
            url: config.generate_url(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl CritiqueTransport for HttpTransport {
    async fn generate(&self, request: &GenerateContentRequest) -> HarmonyResult<GenerateContentResponse> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(HarmonyError::transport(status.as_u16(), body));
        }

        let text = response.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "critique endpoint responded");
        serde_json::from_str(&text)
            .map_err(|e| HarmonyError::schema_parse(e.to_string()).with_context("decoding response envelope"))
    }
}
