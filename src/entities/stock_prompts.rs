//! SeaORM Entity for stock prompts
//!
//! Static reference data scraped from the provider's prompt library, used
//! when a holder requests generation without supplying their own prompt.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subject class a stock prompt was written for
#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromptClass {
    #[sea_orm(string_value = "MAN")]
    Man,
    #[sea_orm(string_value = "WOMAN")]
    Woman,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_prompts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub class: PromptClass,
    /// Uses the `@object` placeholder for the model subject
    pub prompt: String,
    pub negative_prompt: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
