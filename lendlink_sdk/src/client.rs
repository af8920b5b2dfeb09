use crate::error::{Result, SdkError};
use crate::types::*;
use alloy_primitives::{Address, B256};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// HTTP client for a LendLink node
#[derive(Clone)]
pub struct LendLinkClient {
    base_url: String,
    client: Client,
}

impl LendLinkClient {
    /// Create a new client
    pub fn new(node_url: impl Into<String>) -> Self {
        Self {
            base_url: node_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a client with custom reqwest client
    pub fn with_client(node_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: node_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the node to build and store a transaction; returns the link.
    pub async fn create_link(
        &self,
        action: Action,
        token: Address,
        amount: impl Into<String>,
    ) -> Result<CreateLinkResponse> {
        let url = format!("{}/tx/create", self.base_url);
        let body = CreateLinkRequest::new(action, token, amount);
        let response = self.client.post(&url).json(&body).send().await?;
        decode(response).await
    }

    /// Fetch the stored payload and its confirmation state.
    pub async fn fetch_payload(&self, id: &str) -> Result<LinkData> {
        let url = format!("{}/tx/data/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// Report the on-chain result of a link.
    pub async fn confirm(&self, id: &str, tx_hash: B256, approval_tx_hash: Option<B256>) -> Result<()> {
        let url = format!("{}/tx/confirm/{}", self.base_url, id);
        let response = self
            .client
            .post(&url)
            .json(&ConfirmRequest::new(tx_hash, approval_tx_hash))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body: MessageResponse = decode(response).await?;
        if body.success {
            Ok(())
        } else {
            Err(SdkError::Api {
                status,
                message: body.message.unwrap_or_else(|| "confirmation rejected".to_string()),
            })
        }
    }

    /// Check node health
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

/// Non-2xx answers carry `{success:false, error, code}`; surface them as `SdkError::Api`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody { error: Some(error), code: Some(code) }) => format!("{} ({})", error, code),
        Ok(ErrorBody { error: Some(error), .. }) => error,
        _ if text.is_empty() => status.to_string(),
        _ => text,
    };
    Err(SdkError::Api {
        status: status.as_u16(),
        message,
    })
}
