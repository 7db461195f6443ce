//! Shared test fixtures: stub collaborators and an app builder over a
//! MockDatabase connection, so handler flows run without Postgres, the
//! chain, the provider or object storage.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use soulbound_backend::entities::image_models::{self, ModelState};
use soulbound_backend::entities::stock_prompts::{self, PromptClass};
use soulbound_backend::entities::{orders, tokens};
use soulbound_backend::handlers::{image_model, order, token, token_metadata};
use soulbound_backend::services::contract_reads::{ContractReadError, TokenGate};
use soulbound_backend::services::marketplace::MarketplaceService;
use soulbound_backend::services::neural_love::{
    GenerationProvider, OrderStatus, PresignedUpload, ProviderError,
};
use soulbound_backend::services::prompts::StockPromptLibrary;
use soulbound_backend::services::session::Sessions;
use soulbound_backend::services::storage::{ObjectStore, StorageError};
use soulbound_backend::AppState;

pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Bearer token for TEST_ADDRESS, signed with the test secret
pub fn bearer_token() -> String {
    let token = Sessions::new(JWT_SECRET.to_string())
        .issue(TEST_ADDRESS, 1)
        .expect("issuing a test session should succeed");

    format!("Bearer {}", token)
}

/// Token gate stub with a fixed holder answer
pub struct StubGate {
    pub holds: bool,
}

#[async_trait]
impl TokenGate for StubGate {
    async fn holds_token(&self, _address: &str) -> Result<bool, ContractReadError> {
        Ok(self.holds)
    }

    async fn token_id_for(&self, _address: &str) -> Result<Option<String>, ContractReadError> {
        Ok(self.holds.then(|| "1".to_string()))
    }
}

/// Generation provider stub with canned responses and call counters
pub struct StubProvider {
    pub training_status_code: i32,
    pub order_status_code: i32,
    pub order_output_urls: Vec<String>,
    pub estimate_amount: Decimal,
    pub model_id: String,
    pub order_id: String,
    pub fail_order_status: bool,
    pub training_status_calls: AtomicUsize,
    pub order_status_calls: AtomicUsize,
    pub create_model_calls: AtomicUsize,
    pub estimate_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub generate_prompts: Mutex<Vec<String>>,
    pub generate_negative_prompts: Mutex<Vec<Option<String>>>,
}

impl Default for StubProvider {
    fn default() -> Self {
        Self {
            training_status_code: 250,
            order_status_code: 250,
            order_output_urls: Vec::new(),
            estimate_amount: Decimal::ZERO,
            model_id: "model-123".to_string(),
            order_id: "1ed9f57d-2bd1-6ef2-93ae-83bd031b9040".to_string(),
            fail_order_status: false,
            training_status_calls: AtomicUsize::new(0),
            order_status_calls: AtomicUsize::new(0),
            create_model_calls: AtomicUsize::new(0),
            estimate_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            generate_prompts: Mutex::new(Vec::new()),
            generate_negative_prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerationProvider for StubProvider {
    async fn create_presigned_upload(
        &self,
        batch_id: &str,
        extension: &str,
        _content_type: &str,
    ) -> Result<PresignedUpload, ProviderError> {
        let n = self.upload_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PresignedUpload {
            upload_url: format!("https://uploads.example.com/{}/{}", batch_id, n),
            durable_url: format!("https://s3.example.com/{}/{}.{}", batch_id, n, extension),
        })
    }

    async fn upload_training_image(
        &self,
        _upload_url: &str,
        _bytes: Vec<u8>,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn create_custom_model(
        &self,
        _name: &str,
        _subject_class: &str,
        _sources: &[String],
    ) -> Result<String, ProviderError> {
        self.create_model_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.model_id.clone())
    }

    async fn training_status(&self, _model_id: &str) -> Result<i32, ProviderError> {
        self.training_status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.training_status_code)
    }

    async fn estimate_cost(
        &self,
        _prompt: &str,
        _model_id: &str,
    ) -> Result<Decimal, ProviderError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.estimate_amount)
    }

    async fn generate(
        &self,
        prompt: &str,
        negative_prompt: Option<&str>,
        _model_id: &str,
    ) -> Result<String, ProviderError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.generate_prompts
            .lock()
            .unwrap()
            .push(prompt.to_string());
        self.generate_negative_prompts
            .lock()
            .unwrap()
            .push(negative_prompt.map(ToString::to_string));
        Ok(self.order_id.clone())
    }

    async fn order_status(&self, _order_id: &str) -> Result<OrderStatus, ProviderError> {
        self.order_status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_order_status {
            return Err(ProviderError::Api {
                status: 429,
                detail: "Rate limit exceeded".to_string(),
            });
        }
        Ok(OrderStatus {
            status_code: self.order_status_code,
            output_urls: self.order_output_urls.clone(),
        })
    }
}

/// Object store stub recording uploads and removals
pub struct StubStore {
    pub fail_remove: bool,
    pub uploaded: Mutex<Vec<(String, String)>>,
    pub removed: Mutex<Vec<String>>,
}

impl Default for StubStore {
    fn default() -> Self {
        Self {
            fail_remove: false,
            uploaded: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ObjectStore for StubStore {
    async fn upload(
        &self,
        path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.uploaded
            .lock()
            .unwrap()
            .push((String::new(), path.to_string()));
        Ok(())
    }

    async fn upload_from_url(&self, source_url: &str, path: &str) -> Result<String, StorageError> {
        self.uploaded
            .lock()
            .unwrap()
            .push((source_url.to_string(), path.to_string()));
        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.example.com/public/images/{}", path)
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        if self.fail_remove {
            return Err(StorageError::Api {
                status: 500,
                message: "bucket unavailable".to_string(),
            });
        }
        self.removed.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

/// Build the full router over stub collaborators and a mock connection
pub fn build_app(
    db: DatabaseConnection,
    gate: Arc<StubGate>,
    provider: Arc<StubProvider>,
    storage: Arc<StubStore>,
) -> Router {
    let state = AppState {
        db: Arc::new(db),
        provider,
        storage,
        gate,
        // Unroutable on purpose; the refresh is best-effort and failures are
        // logged and dropped
        marketplace: MarketplaceService::new(
            "http://127.0.0.1:9".to_string(),
            String::new(),
            "0x0000000000000000000000000000000000000000".to_string(),
        ),
        sessions: Sessions::new(JWT_SECRET.to_string()),
        prompts: StockPromptLibrary::new(),
    };

    Router::new()
        .route(
            "/api/image-model",
            post(image_model::create_image_model).get(image_model::get_image_model),
        )
        .route("/api/image-model/images", post(image_model::upload_images))
        .route("/api/image-model/train", post(image_model::train_model))
        .route(
            "/api/orders",
            post(order::create_order).get(order::list_orders),
        )
        .route(
            "/api/token",
            post(token::confirm_token)
                .get(token::get_token)
                .delete(token::delete_token),
        )
        .route(
            "/api/token-metadata/{address}",
            get(token_metadata::get_token_metadata),
        )
        .with_state(state)
}

/// image_models row fixture; `updated_secs_ago` anchors the poll cooldown
pub fn image_model_row(
    state: ModelState,
    model_id: Option<&str>,
    descriptor: Option<&str>,
    s3_urls: Vec<&str>,
    updated_secs_ago: i64,
) -> image_models::Model {
    let updated = Utc::now() - Duration::seconds(updated_secs_ago);

    image_models::Model {
        id: 1,
        owner: TEST_ADDRESS.to_string(),
        batch_id: "0b944899d7f54404b22ff947a0dcc211".to_string(),
        model_id: model_id.map(ToString::to_string),
        s3_urls: serde_json::json!(s3_urls),
        descriptor: descriptor.map(ToString::to_string),
        state,
        created_at: (Utc::now() - Duration::hours(1)).into(),
        updated_at: updated.into(),
    }
}

/// orders row fixture
pub fn order_row(
    id: i32,
    order_id: &str,
    ready: bool,
    error: bool,
    image_urls: Vec<&str>,
    updated_secs_ago: i64,
) -> orders::Model {
    let updated = Utc::now() - Duration::seconds(updated_secs_ago);

    orders::Model {
        id,
        owner: TEST_ADDRESS.to_string(),
        order_id: order_id.to_string(),
        prompt: "Portrait art of @me, closeup | painted by Miles Aldridge".to_string(),
        ready,
        error,
        image_urls: serde_json::json!(image_urls),
        created_at: (Utc::now() - Duration::minutes(10)).into(),
        updated_at: updated.into(),
    }
}

/// tokens row fixture
pub fn token_row() -> tokens::Model {
    tokens::Model {
        id: 1,
        owner: TEST_ADDRESS.to_string(),
        name: "Vast Lumber".to_string(),
        description: "Portrait art of @me, closeup | painted by Miles Aldridge".to_string(),
        image_path: "4422e42c-8fbd-4f1b-b0f5-fb254b6b9fa0.png".to_string(),
        image_url:
            "https://storage.example.com/public/images/4422e42c-8fbd-4f1b-b0f5-fb254b6b9fa0.png"
                .to_string(),
        created_at: Utc::now().into(),
    }
}

/// stock_prompts row fixture
pub fn stock_prompt_row(id: i32, prompt: &str) -> stock_prompts::Model {
    stock_prompts::Model {
        id,
        class: PromptClass::Man,
        prompt: prompt.to_string(),
        negative_prompt: "real life photo, 3D graphic, photo, realism".to_string(),
    }
}
