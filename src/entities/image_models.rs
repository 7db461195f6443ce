//! SeaORM Entity for image models
//!
//! One row per SBT holder, tracking the training lifecycle of their custom
//! image-generation model with the provider.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Training lifecycle state. Progression is forward-only; rows are deleted
/// outright on burn, never rolled back.
#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelState {
    #[sea_orm(string_value = "NEEDS_IMAGES")]
    NeedsImages,
    #[sea_orm(string_value = "NEEDS_TRAINING")]
    NeedsTraining,
    #[sea_orm(string_value = "IS_TRAINING")]
    IsTraining,
    #[sea_orm(string_value = "READY")]
    Ready,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "image_models")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Wallet address of the SBT holder (0x format, 42 chars)
    #[sea_orm(unique)]
    pub owner: String,
    /// Namespaces this owner's training uploads with the provider.
    /// Letters and numbers only.
    pub batch_id: String,
    /// Provider-assigned model id; absent until training has been requested
    pub model_id: Option<String>,
    /// Durable URLs of uploaded training images as JSON array
    #[sea_orm(column_type = "JsonBinary")]
    pub s3_urls: Json,
    /// Subject class supplied at training time (man, woman, other)
    pub descriptor: Option<String>,
    pub state: ModelState,
    pub created_at: DateTimeWithTimeZone,
    /// Doubles as the training-status poll cooldown anchor
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
