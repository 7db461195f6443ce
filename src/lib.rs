// src/lib.rs

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::contract_reads::TokenGate;
use services::marketplace::MarketplaceService;
use services::neural_love::GenerationProvider;
use services::prompts::StockPromptLibrary;
use services::session::Sessions;
use services::storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub provider: Arc<dyn GenerationProvider>,
    pub storage: Arc<dyn ObjectStore>,
    pub gate: Arc<dyn TokenGate>,
    pub marketplace: MarketplaceService,
    pub sessions: Sessions,
    pub prompts: StockPromptLibrary,
}

pub mod entities {
    pub mod prelude;
    pub mod image_models;
    pub mod orders;
    pub mod stock_prompts;
    pub mod tokens;
}

pub mod services {
    pub mod contract_reads;
    pub mod guard;
    pub mod lifecycle;
    pub mod marketplace;
    pub mod naming;
    pub mod neural_love;
    pub mod prompts;
    pub mod session;
    pub mod storage;
}

pub mod models;
pub mod handlers;
