//! Orchestration of the full transition choreography.
//!
//! The entities in this crate are deliberately decoupled: the blueprint
//! validates nothing at runtime, the tracker trusts its caller, the
//! execution never moves the record, and SLA timers are abandoned rather
//! than cascaded. [`BlueprintEngine`] is the caller those contracts point
//! at. It owns the load → check → mutate → save cycle across the
//! repositories and keeps the pieces consistent with each other.
//!
//! The engine provides no locking. Making "load, validate, mutate, save"
//! atomic for concurrent requests on the same record is the embedding
//! application's job, wrapped around these calls.

use crate::clock::Clock;
use crate::condition::{evaluate_all, failed_conditions};
use crate::definition::{Blueprint, BlueprintId, Transition, TransitionId};
use crate::execution::{ActorId, TransitionExecution};
use crate::repository::{
    BlueprintRepository, ExecutionRepository, InMemoryBlueprints, InMemoryExecutions,
    InMemoryRecordStates, InMemorySlaInstances, RecordStateRepository, SlaInstanceRepository,
};
use crate::sla::{SlaInstance, SlaStatus};
use crate::tracker::{RecordId, RecordState};
use serde_json::{Map, Value};
use uuid::Uuid;

mod error;

pub use error::EngineError;

/// Drives records through their blueprints.
///
/// Generic over the storage backends and the clock so the whole
/// choreography is testable with in-memory stores and a manual clock.
pub struct BlueprintEngine<B, R, E, S, C> {
    blueprints: B,
    record_states: R,
    executions: E,
    sla_instances: S,
    clock: C,
}

impl<C: Clock>
    BlueprintEngine<InMemoryBlueprints, InMemoryRecordStates, InMemoryExecutions, InMemorySlaInstances, C>
{
    /// An engine over fresh in-memory stores.
    pub fn in_memory(clock: C) -> Self {
        Self::new(
            InMemoryBlueprints::new(),
            InMemoryRecordStates::new(),
            InMemoryExecutions::new(),
            InMemorySlaInstances::new(),
            clock,
        )
    }
}

impl<B, R, E, S, C> BlueprintEngine<B, R, E, S, C>
where
    B: BlueprintRepository,
    R: RecordStateRepository,
    E: ExecutionRepository,
    S: SlaInstanceRepository,
    C: Clock,
{
    pub fn new(blueprints: B, record_states: R, executions: E, sla_instances: S, clock: C) -> Self {
        Self {
            blueprints,
            record_states,
            executions,
            sla_instances,
            clock,
        }
    }

    pub fn blueprints(&self) -> &B {
        &self.blueprints
    }

    pub fn blueprints_mut(&mut self) -> &mut B {
        &mut self.blueprints
    }

    pub fn record_states(&self) -> &R {
        &self.record_states
    }

    pub fn executions(&self) -> &E {
        &self.executions
    }

    pub fn sla_instances(&self) -> &S {
        &self.sla_instances
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The tracked position of a record, if one exists.
    pub fn record_state(&self, blueprint_id: BlueprintId, record_id: RecordId) -> Option<RecordState> {
        self.record_states
            .find_by_blueprint_and_record(blueprint_id, record_id)
    }

    /// Seed a record into the graph.
    ///
    /// Matches the record's current field value to a state, falling back
    /// to the initial state, then to the first configured state. Starts an
    /// SLA timer when the landing state has an active SLA. Idempotent: an
    /// existing row is returned untouched.
    pub fn initialize_record_state(
        &mut self,
        blueprint_id: BlueprintId,
        record_id: RecordId,
        current_field_value: Option<&str>,
    ) -> Result<RecordState, EngineError> {
        if let Some(existing) = self.record_state(blueprint_id, record_id) {
            return Ok(existing);
        }

        let blueprint = self.require_blueprint(blueprint_id)?;

        let state_id = current_field_value
            .and_then(|value| blueprint.state_by_field_value(value))
            .or_else(|| blueprint.initial_state())
            .or_else(|| blueprint.states().first())
            .map(|state| state.id())
            .ok_or(EngineError::NoStates(blueprint_id))?;

        let mut record_state = RecordState::create(blueprint_id, record_id, state_id, &self.clock);
        record_state.set_sla_instance(self.start_sla_timer(&blueprint, state_id, record_id));
        self.record_states.save(record_state.clone());

        Ok(record_state)
    }

    /// The transitions currently offered for a record: active edges out of
    /// its state whose conditions hold against the record data.
    ///
    /// A record with no tracked state yet is initialized first, the same
    /// way a UI hitting a fresh record would expect.
    pub fn available_transitions(
        &mut self,
        blueprint_id: BlueprintId,
        record_id: RecordId,
        record_data: &Map<String, Value>,
    ) -> Result<Vec<Transition>, EngineError> {
        let record_state = match self.record_state(blueprint_id, record_id) {
            Some(existing) => existing,
            None => self.initialize_record_state(blueprint_id, record_id, None)?,
        };

        let blueprint = self.require_blueprint(blueprint_id)?;
        Ok(blueprint
            .transitions_from_state(Some(record_state.current_state_id()))
            .into_iter()
            .filter(|transition| evaluate_all(transition.conditions(), record_data))
            .cloned()
            .collect())
    }

    /// Open an execution attempt for one transition.
    ///
    /// Verifies the record sits at the transition's source state and that
    /// every condition holds, then creates and starts the attempt. The
    /// attempt suspends immediately when the transition demands inputs or
    /// an approval; otherwise it is left in progress, ready to complete.
    pub fn start_transition(
        &mut self,
        blueprint_id: BlueprintId,
        record_id: RecordId,
        transition_id: TransitionId,
        actor: Option<ActorId>,
        record_data: &Map<String, Value>,
    ) -> Result<TransitionExecution, EngineError> {
        let blueprint = self.require_blueprint(blueprint_id)?;
        let transition = blueprint
            .transition_by_id(transition_id)
            .ok_or(EngineError::TransitionNotFound {
                blueprint_id,
                transition_id,
            })?
            .clone();

        let record_state = self.record_state(blueprint_id, record_id);
        match &record_state {
            None if transition.from_state_id().is_some() => {
                return Err(EngineError::MissingRecordState {
                    record_id,
                    transition_id,
                });
            }
            Some(tracked) if Some(tracked.current_state_id()) != transition.from_state_id() => {
                return Err(EngineError::WrongState {
                    record_id,
                    transition_id,
                });
            }
            _ => {}
        }

        if !evaluate_all(transition.conditions(), record_data) {
            return Err(EngineError::ConditionsNotMet(failed_conditions(
                transition.conditions(),
                record_data,
            )));
        }

        let from_state_id = record_state
            .map(|tracked| tracked.current_state_id())
            .map_or(transition.from_state_id(), Some);

        let mut execution = TransitionExecution::create(
            transition_id,
            record_id,
            from_state_id,
            transition.to_state_id(),
            actor,
            &self.clock,
        );
        execution.start(&self.clock);

        if transition.has_requirements() {
            execution.await_requirements(&self.clock)?;
        } else if transition.requires_approval() {
            execution.await_approval(&self.clock)?;
        }

        self.executions.save(execution.clone());
        Ok(execution)
    }

    /// Supply the inputs a suspended attempt is waiting for.
    ///
    /// Rejects with every missing required field at once. On success the
    /// attempt either moves on to awaiting approval or back in progress.
    pub fn submit_requirements(
        &mut self,
        blueprint_id: BlueprintId,
        execution_id: Uuid,
        data: Map<String, Value>,
    ) -> Result<TransitionExecution, EngineError> {
        let mut execution = self.require_execution(execution_id)?;
        let blueprint = self.require_blueprint(blueprint_id)?;
        let transition = blueprint
            .transition_by_id(execution.transition_id())
            .ok_or(EngineError::TransitionNotFound {
                blueprint_id,
                transition_id: execution.transition_id(),
            })?;

        let missing = transition.missing_requirements(&data);
        if !missing.is_empty() {
            return Err(EngineError::RequirementsNotSatisfied(missing));
        }

        execution.set_requirement_data(data, &self.clock);
        execution.resume(&self.clock)?;
        if transition.requires_approval() {
            execution.await_approval(&self.clock)?;
        }

        self.executions.save(execution.clone());
        Ok(execution)
    }

    /// Record one action's outcome on a running attempt.
    pub fn record_action_result(
        &mut self,
        execution_id: Uuid,
        action_key: &str,
        result: Value,
    ) -> Result<TransitionExecution, EngineError> {
        let mut execution = self.require_execution(execution_id)?;
        execution.add_action_result(action_key, result, &self.clock);
        self.executions.save(execution.clone());
        Ok(execution)
    }

    /// Finish an attempt and advance the record.
    ///
    /// Completes the execution, finalizes the SLA timer of the vacated
    /// state, moves the tracker to the target state, and starts the target
    /// state's timer if it has an active SLA. This is the only place the
    /// tracker and the execution log move together.
    pub fn complete_transition(
        &mut self,
        blueprint_id: BlueprintId,
        execution_id: Uuid,
    ) -> Result<TransitionExecution, EngineError> {
        let mut execution = self.require_execution(execution_id)?;
        let blueprint = self.require_blueprint(blueprint_id)?;

        execution.complete(&self.clock)?;

        let record_id = execution.record_id();
        let to_state_id = execution.to_state_id();
        let new_timer = self.start_sla_timer(&blueprint, to_state_id, record_id);

        match self.record_state(blueprint_id, record_id) {
            Some(mut tracked) => {
                self.finalize_sla_timer(tracked.sla_instance_id());
                tracked.transition_to(to_state_id, new_timer, &self.clock);
                self.record_states.save(tracked);
            }
            None => {
                // Entry transition on a record never seen before.
                let mut tracked = RecordState::create(blueprint_id, record_id, to_state_id, &self.clock);
                tracked.set_sla_instance(new_timer);
                self.record_states.save(tracked);
            }
        }

        self.executions.save(execution.clone());
        Ok(execution)
    }

    /// Finish an attempt as failed. The record does not move.
    pub fn fail_transition(
        &mut self,
        execution_id: Uuid,
        message: &str,
    ) -> Result<TransitionExecution, EngineError> {
        let mut execution = self.require_execution(execution_id)?;
        execution.fail(message, &self.clock)?;
        self.executions.save(execution.clone());
        Ok(execution)
    }

    /// Abandon an attempt. Completed attempts cannot be cancelled.
    pub fn cancel_transition(
        &mut self,
        execution_id: Uuid,
    ) -> Result<TransitionExecution, EngineError> {
        let mut execution = self.require_execution(execution_id)?;
        execution.cancel(&self.clock)?;
        self.executions.save(execution.clone());
        Ok(execution)
    }

    /// Every attempt ever made for a record in this blueprint, newest
    /// first.
    pub fn transition_history(
        &self,
        blueprint_id: BlueprintId,
        record_id: RecordId,
    ) -> Result<Vec<TransitionExecution>, EngineError> {
        let blueprint = self.require_blueprint(blueprint_id)?;
        let mut history: Vec<TransitionExecution> = self
            .executions
            .find_by_record(record_id)
            .into_iter()
            .filter(|execution| {
                blueprint.transition_by_id(execution.transition_id()).is_some()
            })
            .collect();
        history.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(history)
    }

    /// Classify the record's time in its current state against that
    /// state's SLA, in the SLA's own counting mode. `None` when the record
    /// is untracked or the state carries no active SLA.
    pub fn sla_status(
        &self,
        blueprint_id: BlueprintId,
        record_id: RecordId,
    ) -> Result<Option<SlaStatus>, EngineError> {
        let blueprint = self.require_blueprint(blueprint_id)?;
        let Some(tracked) = self.record_state(blueprint_id, record_id) else {
            return Ok(None);
        };
        let Some(sla) = blueprint
            .sla_for_state(tracked.current_state_id())
            .filter(|sla| sla.is_active())
        else {
            return Ok(None);
        };

        let elapsed = sla.elapsed_hours(tracked.entered_state_at(), self.clock.now());
        Ok(Some(sla.status_for_elapsed_hours(elapsed)))
    }

    /// Mark every overdue timer for a record as breached. Returns how many
    /// were flipped. Meant to be driven by an external scheduler; nothing
    /// in the engine calls it on its own.
    pub fn sweep_overdue_slas(&mut self, record_id: RecordId) -> Result<usize, EngineError> {
        let now = self.clock.now();
        let mut breached = 0;
        for mut instance in self.sla_instances.find_active_by_record(record_id) {
            if instance.is_breached_at(now) {
                instance.breach(&self.clock)?;
                self.sla_instances.save(instance);
                breached += 1;
            }
        }
        Ok(breached)
    }

    fn require_blueprint(&self, blueprint_id: BlueprintId) -> Result<Blueprint, EngineError> {
        self.blueprints
            .find_by_id(blueprint_id)
            .ok_or(EngineError::BlueprintNotFound(blueprint_id))
    }

    fn require_execution(&self, execution_id: Uuid) -> Result<TransitionExecution, EngineError> {
        self.executions
            .find_by_id(execution_id)
            .ok_or(EngineError::ExecutionNotFound(execution_id))
    }

    /// Start a timer when the state carries an active SLA.
    fn start_sla_timer(
        &mut self,
        blueprint: &Blueprint,
        state_id: crate::definition::StateId,
        record_id: RecordId,
    ) -> Option<Uuid> {
        let sla = blueprint.sla_for_state(state_id).filter(|sla| sla.is_active())?;
        let instance = SlaInstance::create(sla, record_id, &self.clock);
        let id = instance.id();
        self.sla_instances.save(instance);
        Some(id)
    }

    /// Complete a still-active timer the tracker is about to abandon.
    fn finalize_sla_timer(&mut self, instance_id: Option<Uuid>) {
        let Some(id) = instance_id else { return };
        let Some(mut instance) = self.sla_instances.find_by_id(id) else {
            return;
        };
        if instance.is_active() && instance.complete(&self.clock).is_ok() {
            self.sla_instances.save(instance);
        }
    }
}
