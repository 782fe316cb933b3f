//! Per-record current-position tracking.
//!
//! One [`RecordState`] row exists per (blueprint, record) pair: the single
//! fast-read pointer to where that record currently sits in the graph,
//! when it got there, and which SLA timer (if any) is running for the
//! stay. History lives elsewhere, in the transition execution log.

use crate::clock::Clock;
use crate::definition::state::StateId;
use crate::definition::BlueprintId;
use crate::sla::calculator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub type RecordId = u64;

/// A record's current position in one blueprint.
///
/// This entity does not validate state ids against the blueprint graph and
/// does not finalize SLA timers. Both are caller responsibilities: validate
/// the move through the blueprint before calling
/// [`RecordState::transition_to`], and complete the abandoned SLA instance
/// yourself — this row only drops its reference to it.
///
/// # Example
///
/// ```rust
/// use trellis::clock::{Clock, ManualClock};
/// use trellis::tracker::RecordState;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
/// let mut record_state = RecordState::create(1, 42, 1, &clock);
///
/// clock.advance(Duration::hours(30));
/// assert_eq!(record_state.hours_in_current_state(&clock), 30);
///
/// record_state.transition_to(2, None, &clock);
/// assert_eq!(record_state.current_state_id(), 2);
/// assert_eq!(record_state.hours_in_current_state(&clock), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordState {
    id: Uuid,
    blueprint_id: BlueprintId,
    record_id: RecordId,
    current_state_id: StateId,
    entered_state_at: DateTime<Utc>,
    sla_instance_id: Option<Uuid>,
    metadata: Map<String, Value>,
}

impl RecordState {
    /// Place a record at its starting state now.
    pub fn create(
        blueprint_id: BlueprintId,
        record_id: RecordId,
        initial_state_id: StateId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            blueprint_id,
            record_id,
            current_state_id: initial_state_id,
            entered_state_at: clock.now(),
            sla_instance_id: None,
            metadata: Map::new(),
        }
    }

    /// Rehydrate from storage.
    pub fn reconstitute(
        id: Uuid,
        blueprint_id: BlueprintId,
        record_id: RecordId,
        current_state_id: StateId,
        entered_state_at: DateTime<Utc>,
        sla_instance_id: Option<Uuid>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            blueprint_id,
            record_id,
            current_state_id,
            entered_state_at,
            sla_instance_id,
            metadata,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn blueprint_id(&self) -> BlueprintId {
        self.blueprint_id
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn current_state_id(&self) -> StateId {
        self.current_state_id
    }

    pub fn entered_state_at(&self) -> DateTime<Utc> {
        self.entered_state_at
    }

    pub fn sla_instance_id(&self) -> Option<Uuid> {
        self.sla_instance_id
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Move the pointer to a new state, unconditionally.
    ///
    /// Overwrites the current state, resets the entry timestamp to now,
    /// and replaces the SLA reference. Whatever timer was attached to the
    /// vacated state is abandoned here, not finalized.
    pub fn transition_to(
        &mut self,
        new_state_id: StateId,
        sla_instance_id: Option<Uuid>,
        clock: &impl Clock,
    ) {
        self.current_state_id = new_state_id;
        self.entered_state_at = clock.now();
        self.sla_instance_id = sla_instance_id;
    }

    /// Whole hours spent in the current state so far. This is the value
    /// fed to SLA classification when the SLA counts wall-clock hours.
    pub fn hours_in_current_state(&self, clock: &impl Clock) -> i64 {
        calculator::elapsed_hours(self.entered_state_at, clock.now())
    }

    pub fn set_sla_instance(&mut self, sla_instance_id: Option<Uuid>) {
        self.sla_instance_id = sla_instance_id;
    }

    /// Merge entries into the metadata map; keys absent from the patch
    /// are kept, colliding keys take the patch value.
    pub fn update_metadata(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.metadata.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone};

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())
    }

    #[test]
    fn create_stamps_now_and_has_no_sla() {
        let clock = clock();
        let record_state = RecordState::create(1, 42, 1, &clock);

        assert_eq!(record_state.current_state_id(), 1);
        assert_eq!(record_state.entered_state_at(), clock.now());
        assert!(record_state.sla_instance_id().is_none());
    }

    #[test]
    fn hours_in_state_truncate_to_whole_hours() {
        let clock = clock();
        let record_state = RecordState::create(1, 42, 1, &clock);

        clock.advance(Duration::minutes(59));
        assert_eq!(record_state.hours_in_current_state(&clock), 0);

        clock.advance(Duration::minutes(1));
        assert_eq!(record_state.hours_in_current_state(&clock), 1);

        clock.advance(Duration::hours(48));
        assert_eq!(record_state.hours_in_current_state(&clock), 49);
    }

    #[test]
    fn transition_resets_the_entry_clock() {
        let clock = clock();
        let mut record_state = RecordState::create(1, 42, 1, &clock);

        clock.advance(Duration::hours(12));
        record_state.transition_to(2, None, &clock);

        assert_eq!(record_state.current_state_id(), 2);
        assert_eq!(record_state.hours_in_current_state(&clock), 0);
    }

    #[test]
    fn transition_replaces_the_sla_reference() {
        let clock = clock();
        let mut record_state = RecordState::create(1, 42, 1, &clock);

        let first_timer = Uuid::new_v4();
        record_state.set_sla_instance(Some(first_timer));
        assert_eq!(record_state.sla_instance_id(), Some(first_timer));

        let second_timer = Uuid::new_v4();
        record_state.transition_to(2, Some(second_timer), &clock);
        assert_eq!(record_state.sla_instance_id(), Some(second_timer));

        record_state.transition_to(3, None, &clock);
        assert!(record_state.sla_instance_id().is_none());
    }

    #[test]
    fn transition_does_not_check_the_graph() {
        // Validation against the blueprint is the caller's job; a bogus
        // state id is accepted as-is.
        let clock = clock();
        let mut record_state = RecordState::create(1, 42, 1, &clock);
        record_state.transition_to(9999, None, &clock);
        assert_eq!(record_state.current_state_id(), 9999);
    }

    #[test]
    fn metadata_merges_rather_than_replaces() {
        let clock = clock();
        let mut record_state = RecordState::create(1, 42, 1, &clock);

        let mut first = Map::new();
        first.insert("source".to_string(), serde_json::json!("import"));
        record_state.update_metadata(first);

        let mut second = Map::new();
        second.insert("priority".to_string(), serde_json::json!("high"));
        record_state.update_metadata(second);

        assert_eq!(record_state.metadata().len(), 2);
    }

    #[test]
    fn record_state_round_trips_through_serde() {
        let clock = clock();
        let record_state = RecordState::create(1, 42, 1, &clock);
        let json = serde_json::to_string(&record_state).unwrap();
        let back: RecordState = serde_json::from_str(&json).unwrap();
        assert_eq!(record_state, back);
    }
}
