//! Transition execution attempts.
//!
//! A [`TransitionExecution`] records one try at moving one record along
//! one edge of the graph. It is its own small state machine, deliberately
//! decoupled from the record's current-position pointer: completing an
//! attempt never advances the tracker, and failing one never rolls it
//! back. That separation keeps a full audit trail of every attempt —
//! approved, rejected, failed, or abandoned — without touching the single
//! fast-read pointer.
//!
//! Suspension (`AwaitingApproval`, `AwaitingRequirements`) is a persisted
//! handoff, not an in-process wait: a later request loads the same
//! execution by id and resumes or finalizes it. Nothing here times out on
//! its own.

use crate::clock::Clock;
use crate::definition::state::StateId;
use crate::definition::transition::TransitionId;
use crate::tracker::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

mod error;

pub use error::ExecutionError;

pub type ActorId = u64;

/// Lifecycle of a single execution attempt.
///
/// `Pending → InProgress → {AwaitingApproval, AwaitingRequirements} →
/// InProgress → {Completed, Failed, Cancelled, RolledBack}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    InProgress,
    AwaitingApproval,
    AwaitingRequirements,
    Completed,
    Failed,
    Cancelled,
    RolledBack,
}

impl ExecutionStatus {
    /// Terminal statuses admit no further lifecycle operations.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::RolledBack
        )
    }

    /// Suspended waiting on external input (approval or requirement data).
    pub fn is_awaiting(self) -> bool {
        matches!(self, Self::AwaitingApproval | Self::AwaitingRequirements)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::AwaitingApproval => "awaiting_approval",
            Self::AwaitingRequirements => "awaiting_requirements",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

/// One attempt at executing one transition for one record.
///
/// # Example
///
/// ```rust
/// use trellis::clock::ManualClock;
/// use trellis::execution::{ExecutionStatus, TransitionExecution};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
/// let mut execution = TransitionExecution::create(1, 42, Some(1), 2, Some(7), &clock);
/// assert_eq!(execution.status(), ExecutionStatus::Pending);
/// assert!(execution.duration_ms().is_none());
///
/// execution.start(&clock);
/// clock.advance(Duration::seconds(90));
/// execution.complete(&clock).unwrap();
///
/// assert_eq!(execution.status(), ExecutionStatus::Completed);
/// assert_eq!(execution.duration_ms(), Some(90_000));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionExecution {
    id: Uuid,
    transition_id: TransitionId,
    record_id: RecordId,
    from_state_id: Option<StateId>,
    to_state_id: StateId,
    status: ExecutionStatus,
    executed_by: Option<ActorId>,
    requirement_data: Map<String, Value>,
    action_results: Map<String, Value>,
    error_message: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransitionExecution {
    /// Open a new attempt in `Pending`.
    pub fn create(
        transition_id: TransitionId,
        record_id: RecordId,
        from_state_id: Option<StateId>,
        to_state_id: StateId,
        executed_by: Option<ActorId>,
        clock: &impl Clock,
    ) -> Self {
        let now = clock.now();
        Self {
            id: Uuid::new_v4(),
            transition_id,
            record_id,
            from_state_id,
            to_state_id,
            status: ExecutionStatus::Pending,
            executed_by,
            requirement_data: Map::new(),
            action_results: Map::new(),
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: Uuid,
        transition_id: TransitionId,
        record_id: RecordId,
        from_state_id: Option<StateId>,
        to_state_id: StateId,
        status: ExecutionStatus,
        executed_by: Option<ActorId>,
        requirement_data: Map<String, Value>,
        action_results: Map<String, Value>,
        error_message: Option<String>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            transition_id,
            record_id,
            from_state_id,
            to_state_id,
            status,
            executed_by,
            requirement_data,
            action_results,
            error_message,
            started_at,
            completed_at,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transition_id(&self) -> TransitionId {
        self.transition_id
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn from_state_id(&self) -> Option<StateId> {
        self.from_state_id
    }

    pub fn to_state_id(&self) -> StateId {
        self.to_state_id
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn executed_by(&self) -> Option<ActorId> {
        self.executed_by
    }

    pub fn requirement_data(&self) -> &Map<String, Value> {
        &self.requirement_data
    }

    pub fn action_results(&self) -> &Map<String, Value> {
        &self.action_results
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Begin the attempt.
    ///
    /// No idempotency guard: calling this twice re-stamps `started_at`.
    /// A re-entrant caller must not start the same attempt twice.
    pub fn start(&mut self, clock: &impl Clock) {
        let now = clock.now();
        self.status = ExecutionStatus::InProgress;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    /// Suspend until an external approval decision lands. The deciding
    /// process finalizes this same execution with `complete` or `fail`.
    pub fn await_approval(&mut self, clock: &impl Clock) -> Result<(), ExecutionError> {
        self.require_in_progress("suspend for approval")?;
        self.status = ExecutionStatus::AwaitingApproval;
        self.updated_at = clock.now();
        Ok(())
    }

    /// Suspend until the actor supplies the required inputs.
    pub fn await_requirements(&mut self, clock: &impl Clock) -> Result<(), ExecutionError> {
        self.require_in_progress("suspend for requirements")?;
        self.status = ExecutionStatus::AwaitingRequirements;
        self.updated_at = clock.now();
        Ok(())
    }

    /// Lift a suspension back to `InProgress`.
    pub fn resume(&mut self, clock: &impl Clock) -> Result<(), ExecutionError> {
        if !self.status.is_awaiting() {
            return Err(ExecutionError::InvalidStatus {
                operation: "resume",
                status: self.status,
            });
        }
        self.status = ExecutionStatus::InProgress;
        self.updated_at = clock.now();
        Ok(())
    }

    /// Store one supplied requirement field.
    pub fn add_requirement_data(&mut self, key: impl Into<String>, value: Value, clock: &impl Clock) {
        self.requirement_data.insert(key.into(), value);
        self.updated_at = clock.now();
    }

    /// Replace the accumulated requirement data wholesale.
    pub fn set_requirement_data(&mut self, data: Map<String, Value>, clock: &impl Clock) {
        self.requirement_data = data;
        self.updated_at = clock.now();
    }

    /// Record one configured action's outcome, keyed by the action's key.
    /// A repeated key overwrites: last write wins.
    pub fn add_action_result(&mut self, action_key: impl Into<String>, result: Value, clock: &impl Clock) {
        self.action_results.insert(action_key.into(), result);
        self.updated_at = clock.now();
    }

    /// Finish the attempt successfully.
    ///
    /// Does not advance the record's tracker; the caller moves the pointer
    /// separately after observing completion.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), ExecutionError> {
        self.finalize("complete", ExecutionStatus::Completed, clock)
    }

    /// Finish the attempt as failed. The record stays where it was.
    pub fn fail(&mut self, message: impl Into<String>, clock: &impl Clock) -> Result<(), ExecutionError> {
        self.finalize("fail", ExecutionStatus::Failed, clock)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Abandon the attempt.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), ExecutionError> {
        self.finalize("cancel", ExecutionStatus::Cancelled, clock)
    }

    /// Mark the attempt rolled back. Any tracker movement the caller
    /// already made is theirs to reverse.
    pub fn rollback(&mut self, clock: &impl Clock) -> Result<(), ExecutionError> {
        self.finalize("roll back", ExecutionStatus::RolledBack, clock)
    }

    /// Wall-clock milliseconds from start to completion, once both stamps
    /// exist.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) => Some((completed - started).num_milliseconds()),
            _ => None,
        }
    }

    fn finalize(
        &mut self,
        operation: &'static str,
        status: ExecutionStatus,
        clock: &impl Clock,
    ) -> Result<(), ExecutionError> {
        if self.status.is_terminal() {
            return Err(ExecutionError::InvalidStatus {
                operation,
                status: self.status,
            });
        }
        let now = clock.now();
        self.status = status;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn require_in_progress(&self, operation: &'static str) -> Result<(), ExecutionError> {
        if self.status != ExecutionStatus::InProgress {
            return Err(ExecutionError::InvalidStatus {
                operation,
                status: self.status,
            });
        }
        Ok(())
    }
}
