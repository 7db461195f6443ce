use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::entities::tokens;

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmTokenRequest {
    /// Provider order id of the generation batch to pick from
    pub order_id: String,
    /// Index into the order's image URLs
    pub image_index: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenQuery {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub owner: String,
    pub name: String,
    pub description: String,
    pub image_path: String,
    pub image_url: String,
    pub created_at: DateTimeWithTimeZone,
}

impl From<tokens::Model> for TokenResponse {
    fn from(token: tokens::Model) -> Self {
        Self {
            owner: token.owner,
            name: token.name,
            description: token.description,
            image_path: token.image_path,
            image_url: token.image_url,
            created_at: token.created_at,
        }
    }
}

/// OpenSea metadata standard document served to the contract's tokenURI path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetadataResponse {
    pub image: String,
    pub description: String,
    pub name: String,
    pub background_color: String,
}
