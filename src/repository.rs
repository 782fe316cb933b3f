//! Load/save boundary for the engine.
//!
//! The core never talks to storage directly: entities expose `create` and
//! `reconstitute` constructors, and these traits define the handful of
//! queries the engine needs. Implementations own durability, locking, and
//! tenancy — none of which exist inside this crate. The in-memory
//! implementations back the engine's tests and small embedded uses.

use crate::definition::{Blueprint, BlueprintId, FieldId, ModuleId};
use crate::execution::TransitionExecution;
use crate::sla::SlaInstance;
use crate::tracker::{RecordId, RecordState};
use std::collections::HashMap;
use uuid::Uuid;

/// Storage for blueprint definitions.
pub trait BlueprintRepository {
    fn find_by_id(&self, id: BlueprintId) -> Option<Blueprint>;
    fn find_by_field(&self, module_id: ModuleId, field_id: FieldId) -> Option<Blueprint>;
    fn save(&mut self, blueprint: Blueprint);
}

/// Storage for per-record current-position rows.
pub trait RecordStateRepository {
    fn find_by_blueprint_and_record(
        &self,
        blueprint_id: BlueprintId,
        record_id: RecordId,
    ) -> Option<RecordState>;
    fn save(&mut self, record_state: RecordState);
}

/// Storage for execution attempts.
pub trait ExecutionRepository {
    fn find_by_id(&self, id: Uuid) -> Option<TransitionExecution>;
    fn find_by_record(&self, record_id: RecordId) -> Vec<TransitionExecution>;
    fn save(&mut self, execution: TransitionExecution);
}

/// Storage for running SLA timers.
pub trait SlaInstanceRepository {
    fn find_by_id(&self, id: Uuid) -> Option<SlaInstance>;
    fn find_active_by_record(&self, record_id: RecordId) -> Vec<SlaInstance>;
    fn save(&mut self, instance: SlaInstance);
}

/// HashMap-backed blueprint store.
#[derive(Debug, Default)]
pub struct InMemoryBlueprints {
    by_id: HashMap<BlueprintId, Blueprint>,
}

impl InMemoryBlueprints {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlueprintRepository for InMemoryBlueprints {
    fn find_by_id(&self, id: BlueprintId) -> Option<Blueprint> {
        self.by_id.get(&id).cloned()
    }

    fn find_by_field(&self, module_id: ModuleId, field_id: FieldId) -> Option<Blueprint> {
        self.by_id
            .values()
            .find(|blueprint| {
                blueprint.module_id() == module_id && blueprint.field_id() == field_id
            })
            .cloned()
    }

    fn save(&mut self, blueprint: Blueprint) {
        self.by_id.insert(blueprint.id(), blueprint);
    }
}

/// HashMap-backed tracker store, keyed on (blueprint, record).
#[derive(Debug, Default)]
pub struct InMemoryRecordStates {
    by_key: HashMap<(BlueprintId, RecordId), RecordState>,
}

impl InMemoryRecordStates {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStateRepository for InMemoryRecordStates {
    fn find_by_blueprint_and_record(
        &self,
        blueprint_id: BlueprintId,
        record_id: RecordId,
    ) -> Option<RecordState> {
        self.by_key.get(&(blueprint_id, record_id)).cloned()
    }

    fn save(&mut self, record_state: RecordState) {
        self.by_key.insert(
            (record_state.blueprint_id(), record_state.record_id()),
            record_state,
        );
    }
}

/// HashMap-backed execution store.
#[derive(Debug, Default)]
pub struct InMemoryExecutions {
    by_id: HashMap<Uuid, TransitionExecution>,
}

impl InMemoryExecutions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionRepository for InMemoryExecutions {
    fn find_by_id(&self, id: Uuid) -> Option<TransitionExecution> {
        self.by_id.get(&id).cloned()
    }

    fn find_by_record(&self, record_id: RecordId) -> Vec<TransitionExecution> {
        self.by_id
            .values()
            .filter(|execution| execution.record_id() == record_id)
            .cloned()
            .collect()
    }

    fn save(&mut self, execution: TransitionExecution) {
        self.by_id.insert(execution.id(), execution);
    }
}

/// HashMap-backed SLA instance store.
#[derive(Debug, Default)]
pub struct InMemorySlaInstances {
    by_id: HashMap<Uuid, SlaInstance>,
}

impl InMemorySlaInstances {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlaInstanceRepository for InMemorySlaInstances {
    fn find_by_id(&self, id: Uuid) -> Option<SlaInstance> {
        self.by_id.get(&id).cloned()
    }

    fn find_active_by_record(&self, record_id: RecordId) -> Vec<SlaInstance> {
        self.by_id
            .values()
            .filter(|instance| instance.record_id() == record_id && instance.is_active())
            .cloned()
            .collect()
    }

    fn save(&mut self, instance: SlaInstance) {
        self.by_id.insert(instance.id(), instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::definition::State;
    use chrono::{TimeZone, Utc};

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())
    }

    #[test]
    fn blueprints_are_found_by_id_and_field() {
        let mut repo = InMemoryBlueprints::new();
        let mut blueprint = Blueprint::new(1, "Deal Stage", 10, 100);
        blueprint
            .add_state(State::new(1, 1, "New", None))
            .unwrap();
        repo.save(blueprint);

        assert!(repo.find_by_id(1).is_some());
        assert!(repo.find_by_id(2).is_none());
        assert!(repo.find_by_field(10, 100).is_some());
        assert!(repo.find_by_field(10, 999).is_none());
    }

    #[test]
    fn record_states_upsert_on_their_key() {
        let clock = clock();
        let mut repo = InMemoryRecordStates::new();

        let mut record_state = RecordState::create(1, 42, 1, &clock);
        repo.save(record_state.clone());

        record_state.transition_to(2, None, &clock);
        repo.save(record_state);

        let loaded = repo.find_by_blueprint_and_record(1, 42).unwrap();
        assert_eq!(loaded.current_state_id(), 2);
    }

    #[test]
    fn executions_filter_by_record() {
        let clock = clock();
        let mut repo = InMemoryExecutions::new();

        repo.save(TransitionExecution::create(1, 42, Some(1), 2, None, &clock));
        repo.save(TransitionExecution::create(2, 42, Some(2), 3, None, &clock));
        repo.save(TransitionExecution::create(1, 99, Some(1), 2, None, &clock));

        assert_eq!(repo.find_by_record(42).len(), 2);
        assert_eq!(repo.find_by_record(7).len(), 0);
    }

    #[test]
    fn sla_instances_filter_active_by_record() {
        let clock = clock();
        let mut repo = InMemorySlaInstances::new();
        let sla = crate::sla::Sla::new(1, 1, 2, "sla", 8, 0, false);

        let active = SlaInstance::create(&sla, 42, &clock);
        let mut done = SlaInstance::create(&sla, 42, &clock);
        done.complete(&clock).unwrap();

        repo.save(active.clone());
        repo.save(done);

        let found = repo.find_active_by_record(42);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), active.id());
    }
}
