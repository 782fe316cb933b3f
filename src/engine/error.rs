//! Errors for the orchestration layer.

use crate::definition::{BlueprintId, TransitionId};
use crate::execution::ExecutionError;
use crate::sla::SlaError;
use crate::tracker::RecordId;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while choreographing a transition end to end.
///
/// A condition or requirement rejection carries every failed item, so a UI
/// can show the whole list instead of the first miss.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("blueprint {0} not found")]
    BlueprintNotFound(BlueprintId),

    #[error("blueprint {blueprint_id} has no transition {transition_id}")]
    TransitionNotFound {
        blueprint_id: BlueprintId,
        transition_id: TransitionId,
    },

    #[error("execution {0} not found")]
    ExecutionNotFound(Uuid),

    #[error("blueprint {0} has no states defined")]
    NoStates(BlueprintId),

    #[error("record {record_id} has no tracked state and transition {transition_id} requires one")]
    MissingRecordState {
        record_id: RecordId,
        transition_id: TransitionId,
    },

    #[error("record {record_id} is not in the expected state for transition {transition_id}")]
    WrongState {
        record_id: RecordId,
        transition_id: TransitionId,
    },

    #[error("transition conditions not met: {}", .0.join(", "))]
    ConditionsNotMet(Vec<String>),

    #[error("requirements not satisfied: {}", .0.join(", "))]
    RequirementsNotSatisfied(Vec<String>),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Sla(#[from] SlaError),
}
