//! SeaORM Entity for generation orders
//!
//! One row per generation request against the provider. Invariants:
//! `!ready` implies `image_urls` is empty, and `error` implies `ready`
//! with `image_urls` empty.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Wallet address of the SBT holder (0x format, 42 chars)
    pub owner: String,
    /// Provider-assigned order id
    #[sea_orm(unique)]
    pub order_id: String,
    /// Prompt actually sent to the provider, placeholder resolved
    pub prompt: String,
    pub ready: bool,
    /// Terminal failure is modeled as ready-but-failed, not a pending state
    pub error: bool,
    /// Output image URLs as JSON array; empty until ready
    #[sea_orm(column_type = "JsonBinary")]
    pub image_urls: Json,
    pub created_at: DateTimeWithTimeZone,
    /// Doubles as the order-status poll cooldown anchor
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
