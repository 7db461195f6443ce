//! Token metadata handler
//!
//! GET /api/token-metadata/{address}
//!
//! Serves the marketplace-standard metadata document behind the contract's
//! tokenURI. Public, no session required.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entities::prelude::*;
use crate::entities::tokens;
use crate::models::token::TokenMetadataResponse;
use crate::models::ErrorResponse;
use crate::services::contract_reads::is_valid_address;
use crate::AppState;

use super::{error_response, map_db_error};

/// Fixed card background, matches the app theme
const TOKEN_BACKGROUND_COLOR: &str = "182F69";

pub async fn get_token_metadata(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<TokenMetadataResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !is_valid_address(&address) {
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid address"));
    }

    let token = Tokens::find()
        .filter(tokens::Column::Owner.eq(&address))
        .one(state.db.as_ref())
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Token not found"))?;

    // Follow OpenSea metadata standards: https://docs.opensea.io/docs/metadata-standards
    Ok(Json(TokenMetadataResponse {
        image: token.image_url,
        description: token.description,
        name: token.name,
        background_color: TOKEN_BACKGROUND_COLOR.to_string(),
    }))
}
