//! Image-model lifecycle handlers
//!
//! POST /api/image-model          create the per-owner training record
//! GET  /api/image-model          read, with an embedded lazy status refresh
//! POST /api/image-model/images   multipart upload of training photos
//! POST /api/image-model/train    kick off provider-side training

use axum::{
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::image_models::{self, ModelState};
use crate::entities::prelude::*;
use crate::models::image_model::{ImageModelQuery, ImageModelResponse, TrainModelRequest};
use crate::models::ErrorResponse;
use crate::services::contract_reads::is_valid_address;
use crate::services::guard::require_holder;
use crate::services::lifecycle::{advance, AdvanceError, TrainingEvent};
use crate::services::neural_love::STATUS_READY;
use crate::services::prompts::class_for_descriptor;
use crate::AppState;

use super::{error_response, map_db_error, map_guard_error, map_provider_error, session_from_headers};

/// Minimum elapsed time between training-status polls against the provider.
/// Training takes tens of minutes; polling faster only burns rate limit.
const IMAGE_MODEL_REFETCH_INTERVAL_SECS: i64 = 60;

/// Accepted upload extensions
const ALLOWED_FILE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Accepted upload MIME types
const ALLOWED_FILE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Max size per training image (bytes)
const MAX_FILE_SIZE: usize = 4_000_000;

/// Training images required before a model can be trained
const MIN_FILES: usize = 10;

/// Hard cap on accumulated training images
const MAX_FILES: usize = 25;

/// Create ImageModel endpoint handler
///
/// POST /api/image-model
///
/// One row per holder. Creating a second one is a conflict, not an upsert,
/// so clients cannot silently reset an in-progress pipeline.
pub async fn create_image_model(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ImageModelResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session = session_from_headers(&state, &headers);
    let address = require_holder(session.as_ref(), state.gate.as_ref())
        .await
        .map_err(map_guard_error)?;

    let existing = find_owner_model(state.db.as_ref(), &address)
        .await
        .map_err(map_db_error)?;

    if existing.is_some() {
        return Err(error_response(
            StatusCode::CONFLICT,
            "Image model already exists",
        ));
    }

    // The batch id namespaces provider uploads and can only contain letters
    // and numbers
    let batch_id = Uuid::new_v4().simple().to_string();
    let now = Utc::now();

    let model = image_models::ActiveModel {
        owner: Set(address.clone()),
        batch_id: Set(batch_id),
        s3_urls: Set(serde_json::json!([])),
        state: Set(ModelState::NeedsImages),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    let model = model.insert(state.db.as_ref()).await.map_err(map_db_error)?;

    info!(owner = %model.owner, "Created image model");

    Ok(Json(model.into()))
}

/// Get ImageModel endpoint handler
///
/// GET /api/image-model?address=0x...
///
/// Public read. When the model is training and the poll cooldown has
/// elapsed, the provider's training status is checked inline and the row
/// updated before responding; there is no push channel from the provider.
pub async fn get_image_model(
    State(state): State<AppState>,
    Query(query): Query<ImageModelQuery>,
) -> Result<Json<ImageModelResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !is_valid_address(&query.address) {
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid address"));
    }

    let model = find_owner_model(state.db.as_ref(), &query.address)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Image model not found"))?;

    if model.state != ModelState::IsTraining {
        return Ok(Json(model.into()));
    }

    // Prevent polling the provider too frequently since its rate limit is low
    let elapsed = Utc::now().signed_duration_since(model.updated_at);
    if elapsed < Duration::seconds(IMAGE_MODEL_REFETCH_INTERVAL_SECS) {
        return Ok(Json(model.into()));
    }

    let Some(model_id) = model.model_id.clone() else {
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something has gone terribly wrong. modelId does not exist but we think it is training",
        ));
    };

    let status_code = state
        .provider
        .training_status(&model_id)
        .await
        .map_err(map_provider_error)?;

    if status_code == STATUS_READY {
        match advance(
            state.db.as_ref(),
            &model.owner,
            &model.state,
            TrainingEvent::TrainingCompleted,
            |update| update,
        )
        .await
        {
            Ok(_) => info!(owner = %model.owner, "Image model finished training"),
            // A concurrent request observed readiness first; the refetch
            // below picks up whatever it wrote
            Err(AdvanceError::Conflict | AdvanceError::Rejected(_)) => {}
            Err(AdvanceError::Db(err)) => return Err(map_db_error(err)),
        }
    } else {
        // Still training; restart the cooldown from this check
        image_models::Entity::update_many()
            .col_expr(image_models::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(image_models::Column::Owner.eq(&model.owner))
            .exec(state.db.as_ref())
            .await
            .map_err(map_db_error)?;
    }

    let refreshed = find_owner_model(state.db.as_ref(), &query.address)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Image model not found"))?;

    Ok(Json(refreshed.into()))
}

/// Upload training images endpoint handler
///
/// POST /api/image-model/images (multipart)
///
/// The whole batch is validated up front and uploaded all-or-nothing: if any
/// file fails to reach the provider, nothing is persisted and the client
/// retries the batch. Crossing the minimum image count flips the model to
/// NEEDS_TRAINING.
pub async fn upload_images(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ImageModelResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session = session_from_headers(&state, &headers);
    let address = require_holder(session.as_ref(), state.gate.as_ref())
        .await
        .map_err(map_guard_error)?;

    let model = find_owner_model(state.db.as_ref(), &address)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Image model not found"))?;

    if !matches!(model.state, ModelState::NeedsImages | ModelState::NeedsTraining) {
        return Err(error_response(
            StatusCode::CONFLICT,
            "Cannot upload images once training has started",
        ));
    }

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid multipart payload: {}", e),
        )
    })? {
        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        let content_type = field.content_type().unwrap_or("").to_string();
        let bytes = field.bytes().await.map_err(|e| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid multipart payload: {}", e),
            )
        })?;

        let extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or("jpg")
            .to_lowercase();

        files.push(PendingFile {
            file_name,
            extension,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let existing_urls: Vec<String> =
        serde_json::from_value(model.s3_urls.clone()).unwrap_or_default();

    validate_upload_batch(&files, existing_urls.len())?;

    // All-or-nothing: every file must reach the provider before anything is
    // persisted
    let mut all_urls = existing_urls;
    for file in &files {
        let slot = state
            .provider
            .create_presigned_upload(&model.batch_id, &file.extension, &file.content_type)
            .await
            .map_err(map_provider_error)?;

        state
            .provider
            .upload_training_image(&slot.upload_url, file.bytes.clone())
            .await
            .map_err(map_provider_error)?;

        all_urls.push(slot.durable_url);
    }

    info!(
        owner = %address,
        uploaded = files.len(),
        total = all_urls.len(),
        "Uploaded training images"
    );

    if model.state == ModelState::NeedsImages && all_urls.len() >= MIN_FILES {
        match advance(
            state.db.as_ref(),
            &address,
            &model.state,
            TrainingEvent::ImagesAccumulated,
            |update| {
                update.col_expr(
                    image_models::Column::S3Urls,
                    Expr::value(serde_json::json!(all_urls)),
                )
            },
        )
        .await
        {
            Ok(_) => {}
            Err(AdvanceError::Conflict | AdvanceError::Rejected(_)) => {
                return Err(error_response(
                    StatusCode::CONFLICT,
                    "Image model changed state during upload. Please retry",
                ));
            }
            Err(AdvanceError::Db(err)) => return Err(map_db_error(err)),
        }
    } else {
        let result = image_models::Entity::update_many()
            .col_expr(
                image_models::Column::S3Urls,
                Expr::value(serde_json::json!(all_urls)),
            )
            .col_expr(image_models::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(image_models::Column::Owner.eq(&address))
            .filter(image_models::Column::State.eq(model.state.clone()))
            .exec(state.db.as_ref())
            .await
            .map_err(map_db_error)?;

        if result.rows_affected == 0 {
            return Err(error_response(
                StatusCode::CONFLICT,
                "Image model changed state during upload. Please retry",
            ));
        }
    }

    let refreshed = find_owner_model(state.db.as_ref(), &address)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Image model not found"))?;

    Ok(Json(refreshed.into()))
}

/// Train model endpoint handler
///
/// POST /api/image-model/train
///
/// Hands the accumulated training images to the provider and records the
/// returned model id. The transition runs as a conditional update, so a
/// concurrent train request cannot start a second (expensive) training run.
pub async fn train_model(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TrainModelRequest>,
) -> Result<Json<ImageModelResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session = session_from_headers(&state, &headers);
    let address = require_holder(session.as_ref(), state.gate.as_ref())
        .await
        .map_err(map_guard_error)?;

    let descriptor = payload
        .descriptor
        .as_deref()
        .filter(|descriptor| class_for_descriptor(descriptor).is_some())
        .ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                "Need to provide a descriptor for the images. Options are man, woman, other",
            )
        })?
        .to_string();

    let model = find_owner_model(state.db.as_ref(), &address)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Image model not found"))?;

    if model.state != ModelState::NeedsTraining {
        return Err(error_response(
            StatusCode::CONFLICT,
            "Refusing to train. This model is not in the right state",
        ));
    }

    let sources: Vec<String> = serde_json::from_value(model.s3_urls.clone()).unwrap_or_default();
    let name = Uuid::new_v4().to_string();

    let model_id = state
        .provider
        .create_custom_model(&name, &descriptor, &sources)
        .await
        .map_err(map_provider_error)?;

    match advance(
        state.db.as_ref(),
        &address,
        &model.state,
        TrainingEvent::TrainingStarted,
        |update| {
            update
                .col_expr(image_models::Column::ModelId, Expr::value(model_id.clone()))
                .col_expr(
                    image_models::Column::Descriptor,
                    Expr::value(descriptor.clone()),
                )
        },
    )
    .await
    {
        Ok(_) => info!(owner = %address, model_id = %model_id, "Started model training"),
        Err(AdvanceError::Conflict | AdvanceError::Rejected(_)) => {
            // The provider job was already requested and cannot be cancelled;
            // the racing winner's model id stays on record
            warn!(owner = %address, "Lost training race after provider call");
            return Err(error_response(
                StatusCode::CONFLICT,
                "Refusing to train. This model is not in the right state",
            ));
        }
        Err(AdvanceError::Db(err)) => return Err(map_db_error(err)),
    }

    let refreshed = find_owner_model(state.db.as_ref(), &address)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Image model not found"))?;

    Ok(Json(refreshed.into()))
}

async fn find_owner_model(
    db: &DatabaseConnection,
    owner: &str,
) -> Result<Option<image_models::Model>, DbErr> {
    ImageModels::find()
        .filter(image_models::Column::Owner.eq(owner))
        .one(db)
        .await
}

struct PendingFile {
    file_name: String,
    extension: String,
    content_type: String,
    bytes: Vec<u8>,
}

fn validate_upload_batch(
    files: &[PendingFile],
    existing_count: usize,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if files.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Expected at least 1 file",
        ));
    }

    if existing_count + files.len() > MAX_FILES {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Cannot upload more than {} files", MAX_FILES),
        ));
    }

    if !files.iter().all(|file| file.bytes.len() <= MAX_FILE_SIZE) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "Some uploaded files are too large. Max file size is {}MB",
                MAX_FILE_SIZE / 1_000_000
            ),
        ));
    }

    if !files.iter().all(valid_file_type) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "Some uploaded files are not valid. Valid file types are {}",
                ALLOWED_FILE_EXTENSIONS.join(", ")
            ),
        ));
    }

    let all_unique = files.iter().enumerate().all(|(index, file)| {
        files
            .iter()
            .position(|other| other.file_name == file.file_name)
            == Some(index)
    });

    if !all_unique {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Cannot upload duplicate files",
        ));
    }

    Ok(())
}

fn valid_file_type(file: &PendingFile) -> bool {
    ALLOWED_FILE_EXTENSIONS.contains(&file.extension.as_str())
        && ALLOWED_FILE_TYPES.contains(&file.content_type.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_file(name: &str, content_type: &str, size: usize) -> PendingFile {
        PendingFile {
            file_name: name.to_string(),
            extension: name.rsplit('.').next().unwrap_or("jpg").to_lowercase(),
            content_type: content_type.to_string(),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn test_validate_empty_batch() {
        let result = validate_upload_batch(&[], 0);
        assert!(result.is_err());
        let (status, _) = result.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validate_too_many_accumulated_files() {
        let files: Vec<PendingFile> = (0..6)
            .map(|i| make_file(&format!("photo-{}.jpg", i), "image/jpeg", 1000))
            .collect();

        // 20 already uploaded + 6 new crosses the 25 cap
        let result = validate_upload_batch(&files, 20);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_oversized_file() {
        let files = vec![make_file("huge.jpg", "image/jpeg", MAX_FILE_SIZE + 1)];
        let result = validate_upload_batch(&files, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_disallowed_extension() {
        let files = vec![make_file("photo.gif", "image/gif", 1000)];
        let result = validate_upload_batch(&files, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_mime_must_match_allow_list() {
        let files = vec![make_file("photo.jpg", "application/octet-stream", 1000)];
        let result = validate_upload_batch(&files, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_duplicate_filenames() {
        let files = vec![
            make_file("photo.jpg", "image/jpeg", 1000),
            make_file("photo.jpg", "image/jpeg", 2000),
        ];
        let result = validate_upload_batch(&files, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_valid_batch() {
        let files = vec![
            make_file("front.jpg", "image/jpeg", 1000),
            make_file("side.jpeg", "image/jpeg", 1000),
            make_file("hat.png", "image/png", 1000),
        ];
        let result = validate_upload_batch(&files, 0);
        assert!(result.is_ok());
    }

    #[test]
    fn test_uppercase_extension_is_accepted() {
        let files = vec![make_file("SELFIE.JPG", "image/jpeg", 1000)];
        let result = validate_upload_batch(&files, 0);
        assert!(result.is_ok());
    }
}
