//! Marketplace metadata-refresh adapter
//!
//! After a token's image is finalized, ask the marketplace to re-fetch its
//! cached metadata so the new art shows up without manual intervention. This
//! is a cache-freshness nicety; callers log and discard failures.

use reqwest::Client;
use tracing::info;

#[derive(Clone)]
pub struct MarketplaceService {
    client: Client,
    base_url: String,
    api_key: String,
    contract_address: String,
}

impl MarketplaceService {
    pub fn new(base_url: String, api_key: String, contract_address: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            contract_address,
        }
    }

    pub async fn refresh_metadata(
        &self,
        token_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(token_id = token_id, "Requesting marketplace metadata refresh");

        let url = format!(
            "{}/api/v2/chain/ethereum/contract/{}/nfts/{}/refresh",
            self.base_url, self.contract_address, token_id
        );

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(format!("Marketplace API error {}: {}", status, error_text).into());
        }

        Ok(())
    }
}
