use crate::domain::model::{Locality, LocalityQuery};
use crate::domain::ports::{ConfigProvider, LocalityLookup};
use crate::utils::error::{LookupError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Thin client for the OpenPLZ `Localities` endpoint. No caching, no retries.
#[derive(Debug, Clone)]
pub struct OpenPlzClient {
    client: Client,
    endpoint: String,
}

impl OpenPlzClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("plz-validator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(config.api_endpoint(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LocalityLookup for OpenPlzClient {
    async fn fetch_localities(&self, query: &LocalityQuery) -> std::result::Result<Vec<Locality>, LookupError> {
        let params = query.to_params();
        tracing::debug!("Making locality request to: {} {:?}", self.endpoint, params);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Locality API response status: {}", status);

        if !status.is_success() {
            tracing::warn!("⚠️ Locality API returned {}", status);
            return Err(LookupError::Status(status.as_u16()));
        }

        let localities: Vec<Locality> = response.json().await?;
        tracing::debug!("📥 Received {} localities", localities.len());
        Ok(localities)
    }
}
