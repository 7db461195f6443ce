use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::entities::image_models::{self, ModelState};

#[derive(Debug, Clone, Deserialize)]
pub struct ImageModelQuery {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainModelRequest {
    /// Subject class of the training images: man, woman or other
    pub descriptor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageModelResponse {
    pub owner: String,
    pub batch_id: String,
    pub model_id: Option<String>,
    pub s3_urls: Vec<String>,
    pub descriptor: Option<String>,
    pub state: ModelState,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<image_models::Model> for ImageModelResponse {
    fn from(model: image_models::Model) -> Self {
        let s3_urls = serde_json::from_value(model.s3_urls).unwrap_or_default();

        Self {
            owner: model.owner,
            batch_id: model.batch_id,
            model_id: model.model_id,
            s3_urls,
            descriptor: model.descriptor,
            state: model.state,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
