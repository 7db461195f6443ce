//! Prompt resolution for generation orders
//!
//! A caller-supplied prompt must address the custom model through the `@me`
//! placeholder. When no prompt is supplied, a stock prompt matching the image
//! model's descriptor class is picked uniformly at random and its `@object`
//! placeholder rewritten to `@me`. Stock prompts are static reference data,
//! so the per-class lists are cached; the holder check never is.

use moka::future::Cache;
use rand::Rng;
use sea_orm::{ActiveEnum, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use std::sync::Arc;
use std::time::Duration;

use crate::entities::stock_prompts::{self, PromptClass};

/// Placeholder the provider substitutes with the custom-model subject
pub const PROMPT_PLACEHOLDER: &str = "@me";

/// Placeholder used by the provider's stock prompt library
const STOCK_PROMPT_PLACEHOLDER: &str = "@object";

/// Stock prompts only change when the seeding script is re-run
const STOCK_PROMPT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Accepted descriptor values, in the order the API documents them
pub const DESCRIPTORS: [&str; 3] = ["man", "woman", "other"];

/// Does the prompt address the custom model?
pub fn contains_placeholder(prompt: &str) -> bool {
    prompt.contains(PROMPT_PLACEHOLDER)
}

/// Map a training descriptor to its stock-prompt class
pub fn class_for_descriptor(descriptor: &str) -> Option<PromptClass> {
    match descriptor {
        "man" => Some(PromptClass::Man),
        "woman" => Some(PromptClass::Woman),
        "other" => Some(PromptClass::Other),
        _ => None,
    }
}

/// A prompt ready to send to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub prompt: String,
    pub negative_prompt: Option<String>,
}

/// Pick one stock prompt uniformly at random and resolve its placeholder
fn pick_random(prompts: &[stock_prompts::Model]) -> Option<ResolvedPrompt> {
    if prompts.is_empty() {
        return None;
    }

    let index = rand::thread_rng().gen_range(0..prompts.len());
    let pick = &prompts[index];

    Some(ResolvedPrompt {
        prompt: pick
            .prompt
            .replace(STOCK_PROMPT_PLACEHOLDER, PROMPT_PLACEHOLDER),
        negative_prompt: Some(pick.negative_prompt.clone()),
    })
}

#[derive(Clone)]
pub struct StockPromptLibrary {
    cache: Arc<Cache<String, Arc<Vec<stock_prompts::Model>>>>,
}

impl StockPromptLibrary {
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(STOCK_PROMPT_CACHE_TTL)
            .build();

        Self {
            cache: Arc::new(cache),
        }
    }

    /// Random stock prompt of the given class, or None when the class has no
    /// seeded prompts
    pub async fn random_for_class(
        &self,
        db: &DatabaseConnection,
        class: PromptClass,
    ) -> Result<Option<ResolvedPrompt>, DbErr> {
        let cache_key = class.to_value();

        let prompts = match self.cache.get(&cache_key).await {
            Some(cached) => cached,
            None => {
                let rows = stock_prompts::Entity::find()
                    .filter(stock_prompts::Column::Class.eq(class))
                    .all(db)
                    .await?;
                let rows = Arc::new(rows);
                self.cache.insert(cache_key, rows.clone()).await;
                rows
            }
        };

        Ok(pick_random(&prompts))
    }
}

impl Default for StockPromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}
