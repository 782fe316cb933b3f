//! Blueprint definitions: the configured state graph.
//!
//! A [`Blueprint`] binds one record field to a finite-state machine: a set
//! of [`State`]s the field can take and the [`Transition`]s allowed between
//! them, each optionally gated by conditions, required inputs, and an
//! approval step. The definition is a pure query/validation surface; it
//! tracks no record and runs no side effect.
//!
//! Structural integrity is split across two mechanisms. Edits that can
//! never be valid (a transition pointing at a state from another blueprint)
//! fail fast with a [`DefinitionError`]. Configuration completeness
//! (exactly one initial state, at least one terminal) is checked by
//! [`Blueprint::validate`], which returns every problem at once as plain
//! messages so an editor UI can surface them all.

use serde::{Deserialize, Serialize};

pub mod error;
pub mod state;
pub mod transition;

pub use error::DefinitionError;
pub use state::{State, StateId};
pub use transition::{ActionConfig, ApprovalConfig, Requirement, Transition, TransitionId};

use crate::sla::Sla;

pub type BlueprintId = u64;
pub type ModuleId = u64;
pub type FieldId = u64;

/// A per-tenant configured state machine bound to one record field.
///
/// # Example
///
/// ```rust
/// use trellis::definition::{Blueprint, State, Transition};
///
/// let mut blueprint = Blueprint::new(1, "Deal Stage", 10, 100);
///
/// let mut new = State::new(1, 1, "New", Some("new".to_string()));
/// new.set_as_initial();
/// let mut won = State::new(2, 1, "Won", Some("won".to_string()));
/// won.set_as_terminal();
///
/// blueprint.add_state(new).unwrap();
/// blueprint.add_state(won).unwrap();
/// blueprint.add_transition(Transition::new(1, 1, Some(1), 2, "Close")).unwrap();
///
/// assert!(blueprint.validate().is_empty());
/// assert_eq!(blueprint.initial_state().unwrap().id(), 1);
/// assert_eq!(blueprint.transitions_from_state(Some(1)).len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    id: BlueprintId,
    name: String,
    module_id: ModuleId,
    field_id: FieldId,
    description: Option<String>,
    is_active: bool,
    states: Vec<State>,
    transitions: Vec<Transition>,
    slas: Vec<Sla>,
}

impl Blueprint {
    pub fn new(
        id: BlueprintId,
        name: impl Into<String>,
        module_id: ModuleId,
        field_id: FieldId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            module_id,
            field_id,
            description: None,
            is_active: false,
            states: Vec::new(),
            transitions: Vec::new(),
            slas: Vec::new(),
        }
    }

    /// Rehydrate from storage. Performs no structural checks; a repository
    /// is trusted to hand back what was saved.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: BlueprintId,
        name: String,
        module_id: ModuleId,
        field_id: FieldId,
        description: Option<String>,
        is_active: bool,
        states: Vec<State>,
        transitions: Vec<Transition>,
        slas: Vec<Sla>,
    ) -> Self {
        Self {
            id,
            name,
            module_id,
            field_id,
            description,
            is_active,
            states,
            transitions,
            slas,
        }
    }

    pub fn id(&self) -> BlueprintId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    pub fn field_id(&self) -> FieldId {
        self.field_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn slas(&self) -> &[Sla] {
        &self.slas
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Activate or deactivate the blueprint. Callers should only activate
    /// once [`Blueprint::validate`] returns no messages; that contract is
    /// theirs to enforce.
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Add a state to the graph.
    pub fn add_state(&mut self, state: State) -> Result<(), DefinitionError> {
        if state.blueprint_id() != self.id {
            return Err(DefinitionError::ForeignState {
                blueprint_id: self.id,
                owner_id: state.blueprint_id(),
                state_id: state.id(),
            });
        }
        if self.state_by_id(state.id()).is_some() {
            return Err(DefinitionError::DuplicateState {
                blueprint_id: self.id,
                state_id: state.id(),
            });
        }
        self.states.push(state);
        Ok(())
    }

    /// Add a transition. Both endpoints must already exist in this
    /// blueprint (the source may be absent for entry transitions).
    pub fn add_transition(&mut self, transition: Transition) -> Result<(), DefinitionError> {
        if transition.blueprint_id() != self.id {
            return Err(DefinitionError::ForeignTransition {
                blueprint_id: self.id,
                owner_id: transition.blueprint_id(),
                transition_id: transition.id(),
            });
        }
        if self.transition_by_id(transition.id()).is_some() {
            return Err(DefinitionError::DuplicateTransition {
                blueprint_id: self.id,
                transition_id: transition.id(),
            });
        }
        if let Some(from) = transition.from_state_id() {
            self.require_state(from)?;
        }
        self.require_state(transition.to_state_id())?;
        self.transitions.push(transition);
        Ok(())
    }

    /// Attach an SLA to one of this blueprint's states.
    pub fn add_sla(&mut self, sla: Sla) -> Result<(), DefinitionError> {
        if sla.blueprint_id() != self.id {
            return Err(DefinitionError::ForeignSla {
                blueprint_id: self.id,
                owner_id: sla.blueprint_id(),
                sla_id: sla.id(),
            });
        }
        self.require_state(sla.state_id())?;
        self.slas.push(sla);
        Ok(())
    }

    fn require_state(&self, state_id: StateId) -> Result<(), DefinitionError> {
        if self.state_by_id(state_id).is_none() {
            return Err(DefinitionError::UnknownState {
                blueprint_id: self.id,
                state_id,
            });
        }
        Ok(())
    }

    /// The single entry state, or `None` when the graph is mis-configured
    /// (zero or several states flagged initial).
    pub fn initial_state(&self) -> Option<&State> {
        let mut initials = self.states.iter().filter(|state| state.is_initial());
        let first = initials.next()?;
        if initials.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Every state flagged terminal.
    pub fn terminal_states(&self) -> Vec<&State> {
        self.states.iter().filter(|state| state.is_terminal()).collect()
    }

    pub fn state_by_id(&self, state_id: StateId) -> Option<&State> {
        self.states.iter().find(|state| state.id() == state_id)
    }

    pub fn state_by_id_mut(&mut self, state_id: StateId) -> Option<&mut State> {
        self.states.iter_mut().find(|state| state.id() == state_id)
    }

    /// Look a state up by the external field-option value it mirrors.
    pub fn state_by_field_value(&self, value: &str) -> Option<&State> {
        self.states
            .iter()
            .find(|state| state.field_option_value() == Some(value))
    }

    pub fn transition_by_id(&self, transition_id: TransitionId) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|transition| transition.id() == transition_id)
    }

    pub fn transition_by_id_mut(&mut self, transition_id: TransitionId) -> Option<&mut Transition> {
        self.transitions
            .iter_mut()
            .find(|transition| transition.id() == transition_id)
    }

    /// Active transitions leaving the given state. Pass `None` for the
    /// entry transitions that seed newly created records.
    pub fn transitions_from_state(&self, from_state_id: Option<StateId>) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|transition| transition.is_active())
            .filter(|transition| transition.from_state_id() == from_state_id)
            .collect()
    }

    /// The SLA configured for a state, if any.
    pub fn sla_for_state(&self, state_id: StateId) -> Option<&Sla> {
        self.slas.iter().find(|sla| sla.state_id() == state_id)
    }

    /// Check configuration completeness.
    ///
    /// Returns every problem as a human-readable message, never an error,
    /// so a configuration UI can show the full list at once. An empty
    /// result means the blueprint is fit to activate.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.states.is_empty() {
            problems.push("Blueprint must have at least one state".to_string());
        }

        let initial_count = self.states.iter().filter(|state| state.is_initial()).count();
        if initial_count != 1 {
            problems.push("Blueprint must have exactly one initial state".to_string());
        }
        if initial_count > 1 {
            problems.push("Blueprint has multiple initial states".to_string());
        }

        if !self.states.iter().any(|state| state.is_terminal()) {
            problems.push("Blueprint must have at least one terminal state".to_string());
        }

        for transition in &self.transitions {
            if self.state_by_id(transition.to_state_id()).is_none() {
                problems.push(format!(
                    "Transition '{}' targets a state that does not belong to this blueprint",
                    transition.name()
                ));
            }
            if let Some(from) = transition.from_state_id() {
                if self.state_by_id(from).is_none() {
                    problems.push(format!(
                        "Transition '{}' starts from a state that does not belong to this blueprint",
                        transition.name()
                    ));
                }
            }
        }

        problems
    }
}
