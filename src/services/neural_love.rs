//! neural.love generation-provider adapter
//!
//! Wraps the external training/generation HTTP API: presigned training-image
//! uploads, custom-model creation, training-status checks, cost estimates,
//! generation requests and order-status checks. The provider has a low rate
//! limit, so callers gate their polling with a cooldown; this adapter never
//! retries on its own.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// Terminal "ready" status code for both custom models and orders
pub const STATUS_READY: i32 = 250;

/// Order status codes at or above this are terminal failures
pub const STATUS_FAILED: i32 = 900;

/// Error types for provider calls
#[derive(Debug)]
pub enum ProviderError {
    /// Transport-level failure (connection, timeout, malformed body)
    Http(String),
    /// Non-2xx response; `detail` carries the provider's failure reason
    Api { status: u16, detail: String },
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Http(msg) => write!(f, "Provider request failed: {}", msg),
            ProviderError::Api { status, detail } => {
                write!(f, "Provider error {}: {}", status, detail)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Presigned upload slot for one training image
#[derive(Debug, Clone)]
pub struct PresignedUpload {
    /// Short-lived PUT target
    pub upload_url: String,
    /// Durable URL the provider will read the image from during training
    pub durable_url: String,
}

/// Point-in-time status of a generation order
#[derive(Debug, Clone)]
pub struct OrderStatus {
    pub status_code: i32,
    /// Full-size output URLs; empty until the order completes
    pub output_urls: Vec<String>,
}

/// Seam for the generation provider so handlers can be tested against stubs
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn create_presigned_upload(
        &self,
        batch_id: &str,
        extension: &str,
        content_type: &str,
    ) -> Result<PresignedUpload, ProviderError>;

    async fn upload_training_image(
        &self,
        upload_url: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ProviderError>;

    async fn create_custom_model(
        &self,
        name: &str,
        subject_class: &str,
        sources: &[String],
    ) -> Result<String, ProviderError>;

    async fn training_status(&self, model_id: &str) -> Result<i32, ProviderError>;

    async fn estimate_cost(&self, prompt: &str, model_id: &str) -> Result<Decimal, ProviderError>;

    async fn generate(
        &self,
        prompt: &str,
        negative_prompt: Option<&str>,
        model_id: &str,
    ) -> Result<String, ProviderError>;

    async fn order_status(&self, order_id: &str) -> Result<OrderStatus, ProviderError>;
}

#[derive(Clone)]
pub struct NeuralLoveService {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PresignedUploadResponse {
    url: String,
    #[serde(rename = "s3Url")]
    s3_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateModelResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    code: i32,
}

#[derive(Debug, Deserialize)]
struct ModelStatusResponse {
    status: StatusBody,
}

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(rename = "orderId")]
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct OrderOutput {
    full: String,
}

#[derive(Debug, Deserialize)]
struct OrderStatusResponse {
    status: StatusBody,
    #[serde(default)]
    output: Vec<OrderOutput>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    detail: String,
}

impl NeuralLoveService {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
    }
}

/// Turn a non-2xx response into a ProviderError carrying the upstream detail
async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ProviderErrorBody>(&text)
        .map(|body| body.detail)
        .unwrap_or(text);

    ProviderError::Api { status, detail }
}

#[async_trait]
impl GenerationProvider for NeuralLoveService {
    async fn create_presigned_upload(
        &self,
        batch_id: &str,
        extension: &str,
        content_type: &str,
    ) -> Result<PresignedUpload, ProviderError> {
        let response = self
            .post("/v1/upload")
            .json(&json!({
                "extension": extension,
                "contentType": content_type,
                "batchId": batch_id,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: PresignedUploadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(PresignedUpload {
            upload_url: body.url,
            durable_url: body.s3_url,
        })
    }

    async fn upload_training_image(
        &self,
        upload_url: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ProviderError> {
        let response = self
            .client
            .put(upload_url)
            .header("Content-Length", bytes.len())
            .body(bytes)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }

    async fn create_custom_model(
        &self,
        name: &str,
        subject_class: &str,
        sources: &[String],
    ) -> Result<String, ProviderError> {
        info!(
            source_count = sources.len(),
            class = subject_class,
            "Requesting custom model training from neural.love"
        );

        let response = self
            .post("/v1/ai-art/custom-model/create")
            .json(&json!({
                "name": name,
                "class": subject_class,
                "sources": sources,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: CreateModelResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(body.id)
    }

    async fn training_status(&self, model_id: &str) -> Result<i32, ProviderError> {
        info!("Checking training status for model {}", model_id);

        let response = self
            .get(&format!("/v1/ai-art/custom-model/models/{}", model_id))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: ModelStatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(body.status.code)
    }

    async fn estimate_cost(&self, prompt: &str, model_id: &str) -> Result<Decimal, ProviderError> {
        let response = self
            .post("/v1/ai-art/estimate")
            .json(&json!({
                "prompt": prompt,
                "modelId": model_id,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: EstimateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(body.amount)
    }

    async fn generate(
        &self,
        prompt: &str,
        negative_prompt: Option<&str>,
        model_id: &str,
    ) -> Result<String, ProviderError> {
        info!(model_id = model_id, "Requesting generation from neural.love");

        let mut payload = json!({
            "prompt": prompt,
            "modelId": model_id,
        });
        if let Some(negative) = negative_prompt {
            payload["negativePrompt"] = json!(negative);
        }

        let response = self
            .post("/v1/ai-art/generate")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(body.order_id)
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderStatus, ProviderError> {
        let response = self
            .get(&format!("/v1/ai-art/orders/{}", order_id))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: OrderStatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(OrderStatus {
            status_code: body.status.code,
            output_urls: body.output.into_iter().map(|output| output.full).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_detail_is_parsed() {
        let body: ProviderErrorBody =
            serde_json::from_str(r#"{"detail": "Rate limit exceeded"}"#).unwrap();
        assert_eq!(body.detail, "Rate limit exceeded");
    }

    #[test]
    fn test_order_status_response_maps_full_urls() {
        let raw = r#"{
            "status": { "code": 250 },
            "output": [
                { "full": "https://cdn.example.com/1.png" },
                { "full": "https://cdn.example.com/2.png" }
            ]
        }"#;
        let body: OrderStatusResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.status.code, 250);
        assert_eq!(body.output.len(), 2);
        assert_eq!(body.output[0].full, "https://cdn.example.com/1.png");
    }

    #[test]
    fn test_order_status_response_defaults_missing_output() {
        let raw = r#"{ "status": { "code": 50 } }"#;
        let body: OrderStatusResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.status.code, 50);
        assert!(body.output.is_empty());
    }
}
