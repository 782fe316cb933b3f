//! Service-level agreements for blueprint states.
//!
//! An [`Sla`] is configuration: a time budget for how long a record may sit
//! in one state, optionally counted in business hours only. It owns no
//! running timer. The running timer is an [`SlaInstance`], created when a
//! record enters the state and finalized when it leaves or breaches.
//!
//! Breach detection is a read-side computation. Classifying elapsed time
//! never fails an execution or forces a state change; an external poller
//! decides what to do with a [`SlaStatus::Breached`] answer.

use crate::clock::Clock;
use crate::definition::BlueprintId;
use crate::definition::state::StateId;
use crate::tracker::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

pub mod calculator;
mod error;

pub use error::SlaError;

pub type SlaId = u64;

/// Classification of elapsed time against an SLA budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    Active,
    Warning,
    Breached,
}

/// Per-state time budget configuration.
///
/// # Example
///
/// ```rust
/// use trellis::sla::{Sla, SlaStatus};
///
/// let sla = Sla::new(1, 1, 2, "Respond within two days", 48, 0, false);
///
/// // warning_hours of 0 defaults to 75% of the duration.
/// assert_eq!(sla.effective_warning_hours(), 36);
/// assert_eq!(sla.status_for_elapsed_hours(10), SlaStatus::Active);
/// assert_eq!(sla.status_for_elapsed_hours(40), SlaStatus::Warning);
/// assert_eq!(sla.status_for_elapsed_hours(48), SlaStatus::Breached);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sla {
    id: SlaId,
    blueprint_id: BlueprintId,
    state_id: StateId,
    name: String,
    duration_hours: i64,
    warning_hours: i64,
    business_hours_only: bool,
    escalation: Option<Value>,
    is_active: bool,
}

impl Sla {
    pub fn new(
        id: SlaId,
        blueprint_id: BlueprintId,
        state_id: StateId,
        name: impl Into<String>,
        duration_hours: i64,
        warning_hours: i64,
        business_hours_only: bool,
    ) -> Self {
        Self {
            id,
            blueprint_id,
            state_id,
            name: name.into(),
            duration_hours,
            warning_hours,
            business_hours_only,
            escalation: None,
            is_active: true,
        }
    }

    /// Rehydrate from storage without re-deriving anything.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SlaId,
        blueprint_id: BlueprintId,
        state_id: StateId,
        name: String,
        duration_hours: i64,
        warning_hours: i64,
        business_hours_only: bool,
        escalation: Option<Value>,
        is_active: bool,
    ) -> Self {
        Self {
            id,
            blueprint_id,
            state_id,
            name,
            duration_hours,
            warning_hours,
            business_hours_only,
            escalation,
            is_active,
        }
    }

    pub fn id(&self) -> SlaId {
        self.id
    }

    pub fn blueprint_id(&self) -> BlueprintId {
        self.blueprint_id
    }

    pub fn state_id(&self) -> StateId {
        self.state_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration_hours(&self) -> i64 {
        self.duration_hours
    }

    pub fn warning_hours(&self) -> i64 {
        self.warning_hours
    }

    pub fn business_hours_only(&self) -> bool {
        self.business_hours_only
    }

    pub fn escalation(&self) -> Option<&Value> {
        self.escalation.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn set_escalation(&mut self, escalation: Option<Value>) {
        self.escalation = escalation;
    }

    /// Warning threshold in hours.
    ///
    /// A configured value of zero means "use the default": 75% of the
    /// duration, rounded down. A zero passed deliberately is
    /// indistinguishable from unset; that ambiguity is part of the
    /// configuration contract and is preserved here.
    pub fn effective_warning_hours(&self) -> i64 {
        if self.warning_hours == 0 {
            self.duration_hours * 3 / 4
        } else {
            self.warning_hours
        }
    }

    /// Absolute deadline for a timer started at `entered_at`.
    pub fn due_date(&self, entered_at: DateTime<Utc>) -> DateTime<Utc> {
        calculator::due_date(entered_at, self.duration_hours, self.business_hours_only)
    }

    /// Absolute warning instant for a timer started at `entered_at`.
    pub fn warning_date(&self, entered_at: DateTime<Utc>) -> DateTime<Utc> {
        calculator::warning_date(
            entered_at,
            self.effective_warning_hours(),
            self.business_hours_only,
        )
    }

    /// Classify already-measured elapsed hours against this budget.
    ///
    /// The caller is responsible for measuring elapsed time in the right
    /// mode: business hours when `business_hours_only` is set, wall-clock
    /// hours otherwise.
    pub fn status_for_elapsed_hours(&self, elapsed_hours: i64) -> SlaStatus {
        if elapsed_hours >= self.duration_hours {
            SlaStatus::Breached
        } else if elapsed_hours >= self.effective_warning_hours() {
            SlaStatus::Warning
        } else {
            SlaStatus::Active
        }
    }

    /// Elapsed hours between two instants, in this SLA's counting mode.
    pub fn elapsed_hours(&self, entered_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        if self.business_hours_only {
            calculator::elapsed_business_hours(entered_at, now)
        } else {
            calculator::elapsed_hours(entered_at, now)
        }
    }
}

/// Lifecycle of a running SLA timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaInstanceStatus {
    Active,
    Completed,
    Breached,
}

impl fmt::Display for SlaInstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Breached => "breached",
        };
        f.write_str(name)
    }
}

/// A running (or finished) SLA timer for one record in one state.
///
/// Created when the record enters the state. Completed when the record
/// leaves it, or marked breached by a poller once the due date passes.
/// Abandoning the timer on transition is the caller's job; the tracker
/// only drops its reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlaInstance {
    id: Uuid,
    sla_id: SlaId,
    record_id: RecordId,
    state_entered_at: DateTime<Utc>,
    due_at: DateTime<Utc>,
    warn_at: DateTime<Utc>,
    status: SlaInstanceStatus,
    completed_at: Option<DateTime<Utc>>,
}

impl SlaInstance {
    /// Start a timer for `record_id` entering the SLA's state now.
    pub fn create(sla: &Sla, record_id: RecordId, clock: &impl Clock) -> Self {
        let entered_at = clock.now();
        Self {
            id: Uuid::new_v4(),
            sla_id: sla.id(),
            record_id,
            state_entered_at: entered_at,
            due_at: sla.due_date(entered_at),
            warn_at: sla.warning_date(entered_at),
            status: SlaInstanceStatus::Active,
            completed_at: None,
        }
    }

    /// Rehydrate from storage without recomputing dates.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: Uuid,
        sla_id: SlaId,
        record_id: RecordId,
        state_entered_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
        warn_at: DateTime<Utc>,
        status: SlaInstanceStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            sla_id,
            record_id,
            state_entered_at,
            due_at,
            warn_at,
            status,
            completed_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sla_id(&self) -> SlaId {
        self.sla_id
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn state_entered_at(&self) -> DateTime<Utc> {
        self.state_entered_at
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    pub fn warn_at(&self) -> DateTime<Utc> {
        self.warn_at
    }

    pub fn status(&self) -> SlaInstanceStatus {
        self.status
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_active(&self) -> bool {
        self.status == SlaInstanceStatus::Active
    }

    /// Has the deadline passed at `now`? Pure read; does not mutate status.
    pub fn is_breached_at(&self, now: DateTime<Utc>) -> bool {
        now > self.due_at
    }

    /// Inside the warning band at `now` but not yet past the deadline?
    pub fn is_approaching_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.warn_at && !self.is_breached_at(now)
    }

    /// Finalize the timer because the record left the state.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), SlaError> {
        if !self.is_active() {
            return Err(SlaError::NotActive(self.status));
        }
        self.status = SlaInstanceStatus::Completed;
        self.completed_at = Some(clock.now());
        Ok(())
    }

    /// Mark the timer breached. Called by the polling side, not by the
    /// transition machinery.
    pub fn breach(&mut self, clock: &impl Clock) -> Result<(), SlaError> {
        if !self.is_active() {
            return Err(SlaError::NotActive(self.status));
        }
        self.status = SlaInstanceStatus::Breached;
        self.completed_at = Some(clock.now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone};

    fn monday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn sample_sla() -> Sla {
        Sla::new(1, 1, 2, "Qualify within 10h", 10, 7, false)
    }

    #[test]
    fn status_thresholds_are_inclusive() {
        let sla = sample_sla();
        assert_eq!(sla.status_for_elapsed_hours(5), SlaStatus::Active);
        assert_eq!(sla.status_for_elapsed_hours(7), SlaStatus::Warning);
        assert_eq!(sla.status_for_elapsed_hours(8), SlaStatus::Warning);
        assert_eq!(sla.status_for_elapsed_hours(10), SlaStatus::Breached);
        assert_eq!(sla.status_for_elapsed_hours(50), SlaStatus::Breached);
    }

    #[test]
    fn zero_warning_defaults_to_three_quarters_floored() {
        let sla = Sla::new(1, 1, 2, "sla", 10, 0, false);
        assert_eq!(sla.effective_warning_hours(), 7);

        let explicit = Sla::new(2, 1, 2, "sla", 10, 3, false);
        assert_eq!(explicit.effective_warning_hours(), 3);
    }

    #[test]
    fn business_mode_uses_business_elapsed_hours() {
        let sla = Sla::new(1, 1, 2, "sla", 48, 0, true);
        let start = Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap(); // Thursday
        let now = start + Duration::hours(50);

        // 50 raw hours is only 16 business hours, well inside the budget.
        let elapsed = sla.elapsed_hours(start, now);
        assert_eq!(elapsed, 16);
        assert_eq!(sla.status_for_elapsed_hours(elapsed), SlaStatus::Active);
    }

    #[test]
    fn due_and_warning_dates_follow_the_calculator() {
        let sla = Sla::new(1, 1, 2, "sla", 8, 4, false);
        let start = monday_morning();
        assert_eq!(sla.due_date(start), start + Duration::hours(8));
        assert_eq!(sla.warning_date(start), start + Duration::hours(4));
    }

    #[test]
    fn instance_computes_dates_at_creation() {
        let clock = ManualClock::new(monday_morning());
        let sla = Sla::new(1, 1, 2, "sla", 8, 4, false);
        let instance = SlaInstance::create(&sla, 42, &clock);

        assert_eq!(instance.state_entered_at(), monday_morning());
        assert_eq!(instance.due_at(), monday_morning() + Duration::hours(8));
        assert_eq!(instance.warn_at(), monday_morning() + Duration::hours(4));
        assert!(instance.is_active());
        assert!(instance.completed_at().is_none());
    }

    #[test]
    fn instance_read_side_classification() {
        let clock = ManualClock::new(monday_morning());
        let sla = Sla::new(1, 1, 2, "sla", 8, 4, false);
        let instance = SlaInstance::create(&sla, 42, &clock);

        let early = monday_morning() + Duration::hours(2);
        let warned = monday_morning() + Duration::hours(5);
        let late = monday_morning() + Duration::hours(9);

        assert!(!instance.is_approaching_at(early));
        assert!(instance.is_approaching_at(warned));
        assert!(!instance.is_breached_at(warned));
        assert!(instance.is_breached_at(late));
        assert!(!instance.is_approaching_at(late));

        // Classification never mutates the stored status.
        assert_eq!(instance.status(), SlaInstanceStatus::Active);
    }

    #[test]
    fn complete_finalizes_once() {
        let clock = ManualClock::new(monday_morning());
        let sla = sample_sla();
        let mut instance = SlaInstance::create(&sla, 42, &clock);

        clock.advance(Duration::hours(2));
        instance.complete(&clock).unwrap();
        assert_eq!(instance.status(), SlaInstanceStatus::Completed);
        assert_eq!(
            instance.completed_at(),
            Some(monday_morning() + Duration::hours(2))
        );

        let err = instance.complete(&clock).unwrap_err();
        assert_eq!(err, SlaError::NotActive(SlaInstanceStatus::Completed));
    }

    #[test]
    fn breach_is_terminal_too() {
        let clock = ManualClock::new(monday_morning());
        let sla = sample_sla();
        let mut instance = SlaInstance::create(&sla, 42, &clock);

        instance.breach(&clock).unwrap();
        assert_eq!(instance.status(), SlaInstanceStatus::Breached);
        assert!(instance.complete(&clock).is_err());
    }

    #[test]
    fn sla_round_trips_through_serde() {
        let sla = sample_sla();
        let json = serde_json::to_string(&sla).unwrap();
        let back: Sla = serde_json::from_str(&json).unwrap();
        assert_eq!(sla, back);
    }
}
