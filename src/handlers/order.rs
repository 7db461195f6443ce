//! Generation-order handlers
//!
//! POST /api/orders   request a generation batch from the provider
//! GET  /api/orders   list orders, lazily refreshing pending ones

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{info, warn};

use crate::entities::image_models::ModelState;
use crate::entities::prelude::*;
use crate::entities::{image_models, orders};
use crate::models::order::{CreateOrderRequest, OrderResponse, OrdersQuery};
use crate::models::ErrorResponse;
use crate::services::contract_reads::is_valid_address;
use crate::services::guard::require_holder;
use crate::services::neural_love::{STATUS_FAILED, STATUS_READY};
use crate::services::prompts::{class_for_descriptor, contains_placeholder, ResolvedPrompt};
use crate::AppState;

use super::{error_response, map_db_error, map_guard_error, map_provider_error, session_from_headers};

/// Minimum elapsed time between order-status polls against the provider
const ORDER_REFETCH_INTERVAL_SECS: i64 = 30;

/// Cap on orders awaiting provider completion across ALL owners. Generation
/// draws on one shared provider budget.
const MAX_PENDING_ORDERS: u64 = 10;

/// Create order endpoint handler
///
/// POST /api/orders
///
/// Body: `{"prompt": "Renaissance portrait of @me"}` or `{}` for a random
/// stock prompt matching the image model's descriptor.
///
/// The provider's cost estimate must come back zero: this system only runs
/// against models confirmed free, and aborting beats silently charging.
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session = session_from_headers(&state, &headers);
    let address = require_holder(session.as_ref(), state.gate.as_ref())
        .await
        .map_err(map_guard_error)?;

    // Validate a caller-supplied prompt before touching the store
    let user_prompt = payload
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty());

    if let Some(prompt) = user_prompt {
        if !contains_placeholder(prompt) {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Please use @me in prompt to utilise custom model. Example: Renaissance portrait of @me",
            ));
        }
    }

    let model = ImageModels::find()
        .filter(image_models::Column::Owner.eq(&address))
        .one(state.db.as_ref())
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Image model not found"))?;

    if model.state != ModelState::Ready {
        return Err(error_response(
            StatusCode::CONFLICT,
            "Image model is not ready",
        ));
    }

    let Some(model_id) = model.model_id.clone() else {
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something has gone terribly wrong. The image model is ready but has no model id",
        ));
    };

    let pending = Orders::find()
        .filter(orders::Column::Ready.eq(false))
        .count(state.db.as_ref())
        .await
        .map_err(map_db_error)?;

    if pending >= MAX_PENDING_ORDERS {
        return Err(error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many orders are being generated right now. Try again in a few minutes",
        ));
    }

    let resolved = match user_prompt {
        Some(prompt) => ResolvedPrompt {
            prompt: prompt.to_string(),
            negative_prompt: None,
        },
        None => {
            let Some(descriptor) = model.descriptor.as_deref() else {
                return Err(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something has gone terribly wrong. The image model is ready but has no descriptor",
                ));
            };
            let Some(class) = class_for_descriptor(descriptor) else {
                return Err(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!(
                        "Something has gone terribly wrong. Unknown descriptor {}",
                        descriptor
                    ),
                ));
            };

            state
                .prompts
                .random_for_class(state.db.as_ref(), class)
                .await
                .map_err(map_db_error)?
                .ok_or_else(|| {
                    error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "No stock prompts are available for this model",
                    )
                })?
        }
    };

    let amount = state
        .provider
        .estimate_cost(&resolved.prompt, &model_id)
        .await
        .map_err(map_provider_error)?;

    if !amount.is_zero() {
        warn!(owner = %address, amount = %amount, "Refusing paid generation");
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Refusing to generate. Expected a free generation but the provider estimated a cost",
        ));
    }

    let order_id = state
        .provider
        .generate(&resolved.prompt, resolved.negative_prompt.as_deref(), &model_id)
        .await
        .map_err(map_provider_error)?;

    let now = Utc::now();
    let order = orders::ActiveModel {
        owner: Set(address.clone()),
        order_id: Set(order_id),
        prompt: Set(resolved.prompt),
        ready: Set(false),
        error: Set(false),
        image_urls: Set(serde_json::json!([])),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    let order = order.insert(state.db.as_ref()).await.map_err(map_db_error)?;

    info!(owner = %order.owner, order_id = %order.order_id, "Created generation order");

    Ok(Json(order.into()))
}

/// List orders endpoint handler
///
/// GET /api/orders?address=0x...
///
/// Refreshes each pending order whose cooldown has elapsed, then returns all
/// of the owner's orders, newest first. A failed refresh leaves the row
/// stale but safe; the next poll retries.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, (StatusCode, Json<ErrorResponse>)> {
    if !is_valid_address(&query.address) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Invalid address for orders",
        ));
    }

    let pending = Orders::find()
        .filter(orders::Column::Owner.eq(&query.address))
        .filter(orders::Column::Ready.eq(false))
        .all(state.db.as_ref())
        .await
        .map_err(map_db_error)?;

    let now = Utc::now();
    for order in &pending {
        let elapsed = now.signed_duration_since(order.updated_at);
        if elapsed < Duration::seconds(ORDER_REFETCH_INTERVAL_SECS) {
            continue;
        }

        match state.provider.order_status(&order.order_id).await {
            Ok(status) => {
                let outcome = order_refresh_outcome(status.status_code, &status.output_urls);
                apply_refresh(state.db.as_ref(), order, outcome)
                    .await
                    .map_err(map_db_error)?;
            }
            Err(err) => {
                warn!(
                    order_id = %order.order_id,
                    error = %err,
                    "Failed to refresh order status"
                );
            }
        }
    }

    let orders = Orders::find()
        .filter(orders::Column::Owner.eq(&query.address))
        .order_by_desc(orders::Column::CreatedAt)
        .all(state.db.as_ref())
        .await
        .map_err(map_db_error)?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RefreshOutcome {
    /// Terminal success with the generated output URLs
    Completed(Vec<String>),
    /// Terminal failure; the order stays on record as ready-but-failed
    Failed,
    /// Still generating
    Pending,
}

fn order_refresh_outcome(status_code: i32, output_urls: &[String]) -> RefreshOutcome {
    if status_code == STATUS_READY {
        RefreshOutcome::Completed(output_urls.to_vec())
    } else if status_code >= STATUS_FAILED {
        RefreshOutcome::Failed
    } else {
        RefreshOutcome::Pending
    }
}

/// Write a refresh outcome back, keyed on ready = false so two concurrent
/// refreshes of the same order settle deterministically
async fn apply_refresh(
    db: &DatabaseConnection,
    order: &orders::Model,
    outcome: RefreshOutcome,
) -> Result<(), DbErr> {
    let update = orders::Entity::update_many()
        .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(orders::Column::OrderId.eq(&order.order_id))
        .filter(orders::Column::Ready.eq(false));

    let update = match outcome {
        RefreshOutcome::Completed(urls) => update
            .col_expr(orders::Column::Ready, Expr::value(true))
            .col_expr(orders::Column::Error, Expr::value(false))
            .col_expr(
                orders::Column::ImageUrls,
                Expr::value(serde_json::json!(urls)),
            ),
        RefreshOutcome::Failed => update
            .col_expr(orders::Column::Ready, Expr::value(true))
            .col_expr(orders::Column::Error, Expr::value(true))
            .col_expr(
                orders::Column::ImageUrls,
                Expr::value(serde_json::json!([])),
            ),
        RefreshOutcome::Pending => update,
    };

    update.exec(db).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> Vec<String> {
        vec![
            "https://cdn.example.com/1.png".to_string(),
            "https://cdn.example.com/2.png".to_string(),
        ]
    }

    #[test]
    fn test_ready_code_completes_with_urls() {
        let outcome = order_refresh_outcome(STATUS_READY, &urls());
        assert_eq!(outcome, RefreshOutcome::Completed(urls()));
    }

    #[test]
    fn test_failure_codes_mark_error() {
        assert_eq!(order_refresh_outcome(900, &[]), RefreshOutcome::Failed);
        assert_eq!(order_refresh_outcome(997, &urls()), RefreshOutcome::Failed);
    }

    #[test]
    fn test_everything_else_stays_pending() {
        for code in [0, 50, 100, 249, 251, 899] {
            assert_eq!(order_refresh_outcome(code, &[]), RefreshOutcome::Pending);
        }
    }
}
