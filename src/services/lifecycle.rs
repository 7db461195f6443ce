//! Image-model training state machine
//!
//! `transition` is the single authority on legal lifecycle moves; every
//! handler goes through `advance`, which applies the move as a conditional
//! update keyed on the expected current state. Two concurrent requests for
//! the same owner therefore race deterministically: exactly one row update
//! wins and the loser reports a conflict instead of double-training.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, UpdateMany};

use crate::entities::image_models::{self, ModelState};

/// Events that move an image model forward through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingEvent {
    /// Enough training images have accumulated
    ImagesAccumulated,
    /// The provider accepted a training request
    TrainingStarted,
    /// The provider reported the model ready
    TrainingCompleted,
}

/// An event that is not legal in the current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRejected {
    pub current: ModelState,
    pub event: TrainingEvent,
}

impl std::fmt::Display for TransitionRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot apply {:?} while the model is in state {:?}",
            self.event, self.current
        )
    }
}

impl std::error::Error for TransitionRejected {}

/// The closed set of legal lifecycle moves
pub fn transition(
    current: &ModelState,
    event: TrainingEvent,
) -> Result<ModelState, TransitionRejected> {
    match (current, event) {
        (ModelState::NeedsImages, TrainingEvent::ImagesAccumulated) => Ok(ModelState::NeedsTraining),
        (ModelState::NeedsTraining, TrainingEvent::TrainingStarted) => Ok(ModelState::IsTraining),
        (ModelState::IsTraining, TrainingEvent::TrainingCompleted) => Ok(ModelState::Ready),
        (current, event) => Err(TransitionRejected {
            current: current.clone(),
            event,
        }),
    }
}

/// Error types for applying a transition to the store
#[derive(Debug)]
pub enum AdvanceError {
    /// The event is not legal in the current state
    Rejected(TransitionRejected),
    /// The conditional update matched no row: a concurrent request moved the
    /// model first (or the row was deleted by a burn)
    Conflict,
    Db(DbErr),
}

impl std::fmt::Display for AdvanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvanceError::Rejected(rejected) => write!(f, "Transition rejected: {}", rejected),
            AdvanceError::Conflict => write!(f, "Model state changed concurrently"),
            AdvanceError::Db(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for AdvanceError {}

/// Apply `event` to the owner's image model as a compare-and-swap on the
/// expected current state. `customize` lets callers set event-specific
/// columns (model id, descriptor, accumulated image URLs) in the same
/// conditional update.
pub async fn advance<C, F>(
    db: &C,
    owner: &str,
    current: &ModelState,
    event: TrainingEvent,
    customize: F,
) -> Result<ModelState, AdvanceError>
where
    C: ConnectionTrait,
    F: FnOnce(UpdateMany<image_models::Entity>) -> UpdateMany<image_models::Entity>,
{
    let next = transition(current, event).map_err(AdvanceError::Rejected)?;

    let update = image_models::Entity::update_many()
        .col_expr(image_models::Column::State, Expr::value(next.clone()))
        .col_expr(image_models::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(image_models::Column::Owner.eq(owner))
        .filter(image_models::Column::State.eq(current.clone()));

    let result = customize(update).exec(db).await.map_err(AdvanceError::Db)?;

    if result.rows_affected == 0 {
        return Err(AdvanceError::Conflict);
    }

    Ok(next)
}
