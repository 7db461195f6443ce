//! Token finalization handlers
//!
//! POST   /api/token   promote a selected generated image into the Token record
//! GET    /api/token   public metadata lookup
//! DELETE /api/token   burn teardown for an address that no longer holds the SBT

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::entities::prelude::*;
use crate::entities::{image_models, orders, tokens};
use crate::models::token::{ConfirmTokenRequest, TokenQuery, TokenResponse};
use crate::models::ErrorResponse;
use crate::services::contract_reads::is_valid_address;
use crate::services::guard::{require_holder, require_non_holder};
use crate::services::naming::display_name;
use crate::AppState;

use super::{error_response, map_db_error, map_guard_error, session_from_headers};

/// Confirm token endpoint handler
///
/// POST /api/token
///
/// Body: `{"order_id": "...", "image_index": 2}`
///
/// Copies the selected output into durable storage (provider URLs expire)
/// and records the Token row that backs the on-chain metadata. The blob
/// upload happens first; a crash before the row insert orphans one
/// content-addressed blob, which is accepted.
pub async fn confirm_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ConfirmTokenRequest>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session = session_from_headers(&state, &headers);
    let address = require_holder(session.as_ref(), state.gate.as_ref())
        .await
        .map_err(map_guard_error)?;

    let order = Orders::find()
        .filter(orders::Column::OrderId.eq(&payload.order_id))
        .filter(orders::Column::Owner.eq(&address))
        .one(state.db.as_ref())
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Order not found"))?;

    let image_urls: Vec<String> =
        serde_json::from_value(order.image_urls.clone()).unwrap_or_default();

    let Some(source_url) = image_urls.get(payload.image_index) else {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "Image index not found for user",
        ));
    };

    let existing = Tokens::find()
        .filter(tokens::Column::Owner.eq(&address))
        .one(state.db.as_ref())
        .await
        .map_err(map_db_error)?;

    if existing.is_some() {
        return Err(error_response(
            StatusCode::CONFLICT,
            "Token already exists",
        ));
    }

    let image_path = format!("{}.png", Uuid::new_v4());
    let image_url = state
        .storage
        .upload_from_url(source_url, &image_path)
        .await
        .map_err(|err| {
            error!(owner = %address, error = %err, "Failed to store selected image");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save image")
        })?;

    let name = display_name(&address).map_err(|err| {
        error!(owner = %address, error = %err, "Failed to derive display name");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to name token")
    })?;

    let token = tokens::ActiveModel {
        owner: Set(address.clone()),
        name: Set(name),
        description: Set(order.prompt.clone()),
        image_path: Set(image_path),
        image_url: Set(image_url),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    let token = token.insert(state.db.as_ref()).await.map_err(map_db_error)?;

    info!(owner = %token.owner, "Finalized token image");

    // Nudge the marketplace to re-fetch cached metadata. Stale metadata is a
    // nicety, not correctness, so failures are logged and dropped.
    match state.gate.token_id_for(&address).await {
        Ok(Some(token_id)) => {
            if let Err(err) = state.marketplace.refresh_metadata(&token_id).await {
                warn!(owner = %address, error = %err, "Marketplace metadata refresh failed");
            }
        }
        Ok(None) => {}
        Err(err) => {
            warn!(owner = %address, error = %err, "Could not look up token id for refresh");
        }
    }

    Ok(Json(token.into()))
}

/// Get token endpoint handler
///
/// GET /api/token?address=0x...
///
/// Public lookup; responds with the Token row or JSON null when the holder
/// has not confirmed an image yet.
pub async fn get_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Option<TokenResponse>>, (StatusCode, Json<ErrorResponse>)> {
    if !is_valid_address(&query.address) {
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid address"));
    }

    let token = Tokens::find()
        .filter(tokens::Column::Owner.eq(&query.address))
        .one(state.db.as_ref())
        .await
        .map_err(map_db_error)?;

    Ok(Json(token.map(TokenResponse::from)))
}

/// Delete token endpoint handler
///
/// DELETE /api/token
///
/// Burn teardown: once the address no longer holds the SBT, every trace of
/// its pipeline is removed (orders, image model, token row, stored blob). A
/// failed blob deletion is surfaced, not swallowed; a dangling blob is a
/// real resource leak.
pub async fn delete_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let session = session_from_headers(&state, &headers);
    let address = require_non_holder(session.as_ref(), state.gate.as_ref())
        .await
        .map_err(map_guard_error)?;

    let token = Tokens::find()
        .filter(tokens::Column::Owner.eq(&address))
        .one(state.db.as_ref())
        .await
        .map_err(map_db_error)?;

    let image_path = token.map(|token| token.image_path);

    Orders::delete_many()
        .filter(orders::Column::Owner.eq(&address))
        .exec(state.db.as_ref())
        .await
        .map_err(map_db_error)?;

    ImageModels::delete_many()
        .filter(image_models::Column::Owner.eq(&address))
        .exec(state.db.as_ref())
        .await
        .map_err(map_db_error)?;

    Tokens::delete_many()
        .filter(tokens::Column::Owner.eq(&address))
        .exec(state.db.as_ref())
        .await
        .map_err(map_db_error)?;

    let Some(image_path) = image_path else {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "Could not find image to delete",
        ));
    };

    state.storage.remove(&image_path).await.map_err(|err| {
        error!(owner = %address, error = %err, "Failed to delete stored image");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete image")
    })?;

    info!(owner = %address, "Deleted token and all generated data");

    Ok(StatusCode::OK)
}
