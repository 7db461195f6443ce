//! SeaORM Entity for finalized tokens
//!
//! The permanent record behind the on-chain token's metadata. A row exists
//! only once the holder has confirmed a generated image.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Wallet address of the SBT holder (0x format, 42 chars)
    #[sea_orm(unique)]
    pub owner: String,
    /// Display name derived from the owner address
    pub name: String,
    /// The prompt the selected image was generated from
    pub description: String,
    /// Object-store path, kept for deletion on burn
    pub image_path: String,
    /// Public URL served as the on-chain metadata image
    pub image_url: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
