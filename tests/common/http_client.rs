//! HTTP client helpers for tests.

use std::time::Duration;

use serde_json::{Value, json};

use riskmap::gateway::RISKMAP_STATUS_HEADER;
use riskmap::gateway::payload::ClassifyResponse;
use riskmap::validate::RiskItem;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Returns the parsed response and the status header.
    pub async fn classify(&self, text: &str) -> Result<(ClassifyResponse, String), TestClientError> {
        let resp = self
            .client
            .post(self.url("/v1/classify"))
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status_header = resp
            .headers()
            .get(RISKMAP_STATUS_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        match resp.status().as_u16() {
            200 => Ok((resp.json().await?, status_header)),
            status => Err(TestClientError::UnexpectedStatus(status, resp.json().await?)),
        }
    }

    /// Returns the CSV body and the attachment filename.
    pub async fn export(&self, items: &[RiskItem]) -> Result<(String, String), TestClientError> {
        let resp = self
            .client
            .post(self.url("/v1/export"))
            .json(&json!({ "items": items }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(TestClientError::UnexpectedStatus(status, resp.json().await?));
        }

        let disposition = resp
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok((resp.text().await?, disposition))
    }

    pub async fn get_json(&self, path: &str) -> Result<(u16, Value), TestClientError> {
        let resp = self.client.get(self.url(path)).send().await?;
        let status = resp.status().as_u16();
        Ok((status, resp.json().await?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0} - Body: {1}")]
    UnexpectedStatus(u16, Value),
}
