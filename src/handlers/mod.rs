pub mod image_model;
pub mod order;
pub mod token;
pub mod token_metadata;

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::Json;
use sea_orm::DbErr;

use crate::models::ErrorResponse;
use crate::services::guard::GuardError;
use crate::services::neural_love::ProviderError;
use crate::services::session::Session;
use crate::AppState;

/// Resolve the request's bearer session, if any
pub(crate) fn session_from_headers(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    state.sessions.verify(authorization)
}

pub(crate) fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
}

pub(crate) fn map_guard_error(err: GuardError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        GuardError::Unauthenticated | GuardError::Unauthorized | GuardError::StillHolder => {
            StatusCode::UNAUTHORIZED
        }
        GuardError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    error_response(status, err.to_string())
}

pub(crate) fn map_db_error(err: DbErr) -> (StatusCode, Json<ErrorResponse>) {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Database error: {}", err),
    )
}

pub(crate) fn map_provider_error(err: ProviderError) -> (StatusCode, Json<ErrorResponse>) {
    error_response(StatusCode::BAD_GATEWAY, err.to_string())
}
