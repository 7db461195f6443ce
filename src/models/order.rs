use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::entities::orders;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    /// Free-text prompt addressing the custom model via `@me`. When absent,
    /// a random stock prompt matching the model's descriptor is used.
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersQuery {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub owner: String,
    pub order_id: String,
    pub prompt: String,
    pub ready: bool,
    pub error: bool,
    pub image_urls: Vec<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<orders::Model> for OrderResponse {
    fn from(order: orders::Model) -> Self {
        let image_urls = serde_json::from_value(order.image_urls).unwrap_or_default();

        Self {
            owner: order.owner,
            order_id: order.order_id,
            prompt: order.prompt,
            ready: order.ready,
            error: order.error,
            image_urls,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
