//! Fail-fast errors for blueprint graph mutation.
//!
//! These reject structurally impossible edits at the call site. Softer
//! configuration problems (a graph with no terminal state, say) are the
//! domain of `Blueprint::validate`, which reports rather than fails.

use super::state::StateId;
use super::transition::TransitionId;
use super::BlueprintId;
use crate::sla::SlaId;
use thiserror::Error;

/// Errors raised when mutating a blueprint's graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("state {state_id} belongs to blueprint {owner_id}, not blueprint {blueprint_id}")]
    ForeignState {
        blueprint_id: BlueprintId,
        owner_id: BlueprintId,
        state_id: StateId,
    },

    #[error("transition {transition_id} belongs to blueprint {owner_id}, not blueprint {blueprint_id}")]
    ForeignTransition {
        blueprint_id: BlueprintId,
        owner_id: BlueprintId,
        transition_id: TransitionId,
    },

    #[error("SLA {sla_id} belongs to blueprint {owner_id}, not blueprint {blueprint_id}")]
    ForeignSla {
        blueprint_id: BlueprintId,
        owner_id: BlueprintId,
        sla_id: SlaId,
    },

    #[error("blueprint {blueprint_id} has no state {state_id}")]
    UnknownState {
        blueprint_id: BlueprintId,
        state_id: StateId,
    },

    #[error("blueprint {blueprint_id} already has a state with id {state_id}")]
    DuplicateState {
        blueprint_id: BlueprintId,
        state_id: StateId,
    },

    #[error("blueprint {blueprint_id} already has a transition with id {transition_id}")]
    DuplicateTransition {
        blueprint_id: BlueprintId,
        transition_id: TransitionId,
    },
}
