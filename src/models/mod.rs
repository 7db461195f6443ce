pub mod image_model;
pub mod order;
pub mod token;

use serde::{Deserialize, Serialize};

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
