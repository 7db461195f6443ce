// src/bin/populate_stock_prompts.rs
//
// One-shot seeding of the stock_prompts table from the provider's prompt
// library. Run once per environment (and again whenever the library should
// be refreshed):
//
//   cargo run --bin populate_stock_prompts

use sea_orm::{ActiveEnum, Database, EntityTrait, Set};
use serde::Deserialize;
use std::env;

use soulbound_backend::entities::prelude::*;
use soulbound_backend::entities::stock_prompts::{self, PromptClass};

#[derive(Debug, Deserialize)]
struct PromptLibraryEntry {
    prompt: String,
    #[serde(rename = "negativePrompt")]
    negative_prompt: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url).await?;

    let api_key = env::var("NEURAL_LOVE_API_KEY").expect("NEURAL_LOVE_API_KEY must be set");
    let library_url = env::var("NEURAL_LOVE_PROMPT_LIBRARY_URL")
        .unwrap_or_else(|_| "https://saas.neural.love".to_string());

    let client = reqwest::Client::new();

    for class in [PromptClass::Man, PromptClass::Woman, PromptClass::Other] {
        let class_param = class.to_value().to_lowercase();
        println!("Fetching {} prompts...", class_param);

        let response = client
            .get(format!("{}/api/ai-photostock/pack/prompts", library_url))
            .query(&[("class", class_param.as_str())])
            .header("Authorization", format!("Bearer {}", api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(format!("Prompt library error {}: {}", status, error_text).into());
        }

        let entries: Vec<PromptLibraryEntry> = response.json().await?;
        println!("  {} prompts for class {}", entries.len(), class_param);

        if entries.is_empty() {
            continue;
        }

        let rows: Vec<stock_prompts::ActiveModel> = entries
            .into_iter()
            .map(|entry| stock_prompts::ActiveModel {
                class: Set(class.clone()),
                prompt: Set(entry.prompt),
                negative_prompt: Set(entry.negative_prompt),
                ..Default::default()
            })
            .collect();

        StockPrompts::insert_many(rows).exec(&db).await?;
    }

    println!("Done");
    Ok(())
}
