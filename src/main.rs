use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::{env, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soulbound_backend::handlers::{image_model, order, token, token_metadata};
use soulbound_backend::services::contract_reads::SoulboundContractService;
use soulbound_backend::services::marketplace::MarketplaceService;
use soulbound_backend::services::neural_love::NeuralLoveService;
use soulbound_backend::services::prompts::StockPromptLibrary;
use soulbound_backend::services::session::Sessions;
use soulbound_backend::services::storage::SupabaseStorageService;
use soulbound_backend::AppState;

/// Multipart cap: up to 25 training images at 4MB each, plus framing
const UPLOAD_BODY_LIMIT: usize = 110 * 1024 * 1024;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,soulbound_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let provider = NeuralLoveService::new(
        env::var("NEURAL_LOVE_API_KEY").expect("NEURAL_LOVE_API_KEY must be set"),
        env::var("NEURAL_LOVE_BASE_URL")
            .unwrap_or_else(|_| "https://api.neural.love".to_string()),
    );

    let storage = SupabaseStorageService::new(
        env::var("SUPABASE_URL").expect("SUPABASE_URL must be set"),
        env::var("SUPABASE_KEY").expect("SUPABASE_KEY must be set"),
        env::var("SUPABASE_BUCKET").unwrap_or_else(|_| "images".to_string()),
    );

    let contract_address =
        env::var("SOULBOUND_AI_ADDRESS").expect("SOULBOUND_AI_ADDRESS must be set");
    let gate = SoulboundContractService::new(
        &env::var("RPC_URL").expect("RPC_URL must be set"),
        &contract_address,
    )
    .expect("Failed to initialize contract reads");

    let marketplace = MarketplaceService::new(
        env::var("MARKETPLACE_BASE_URL")
            .unwrap_or_else(|_| "https://api.opensea.io".to_string()),
        env::var("MARKETPLACE_API_KEY").unwrap_or_default(),
        contract_address,
    );

    let sessions = Sessions::new(env::var("JWT_SECRET").expect("JWT_SECRET must be set"));

    let state = AppState {
        db: Arc::new(db),
        provider: Arc::new(provider),
        storage: Arc::new(storage),
        gate: Arc::new(gate),
        marketplace,
        sessions,
        prompts: StockPromptLibrary::new(),
    };

    // Build router
    let app = Router::new()
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
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
