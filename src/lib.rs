//! Trellis: configurable state machines for business records.
//!
//! A tenant draws a blueprint — states a record field can take and the
//! guarded transitions between them — and trellis drives records through
//! it: tracking each record's position, suspending transitions on
//! approvals or missing inputs, and timing states against SLA budgets in
//! wall-clock or business hours.
//!
//! The crate splits into four cores plus the orchestration over them:
//!
//! - [`definition`]: the configured graph and its validation
//! - [`tracker`]: the per-record current-position pointer
//! - [`execution`]: the audit trail of transition attempts
//! - [`sla`]: time budgets, business-hours arithmetic, running timers
//! - [`engine`]: the load → check → mutate → save choreography over
//!   [`repository`] traits
//!
//! Time always enters through the [`clock::Clock`] trait, so every duration
//! and deadline is testable with a manual clock.
//!
//! # Example
//!
//! ```rust
//! use trellis::clock::ManualClock;
//! use trellis::definition::{Blueprint, State, Transition};
//! use trellis::engine::BlueprintEngine;
//! use trellis::execution::ExecutionStatus;
//! use trellis::repository::BlueprintRepository;
//! use chrono::{TimeZone, Utc};
//! use serde_json::Map;
//!
//! let mut blueprint = Blueprint::new(1, "Ticket Status", 10, 100);
//! let mut open = State::new(1, 1, "Open", Some("open".to_string()));
//! open.set_as_initial();
//! let mut closed = State::new(2, 1, "Closed", Some("closed".to_string()));
//! closed.set_as_terminal();
//! blueprint.add_state(open).unwrap();
//! blueprint.add_state(closed).unwrap();
//! blueprint.add_transition(Transition::new(1, 1, Some(1), 2, "Close")).unwrap();
//! assert!(blueprint.validate().is_empty());
//!
//! let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
//! let mut engine = BlueprintEngine::in_memory(clock);
//! engine.blueprints_mut().save(blueprint);
//!
//! engine.initialize_record_state(1, 42, None).unwrap();
//! let execution = engine
//!     .start_transition(1, 42, 1, None, &Map::new())
//!     .unwrap();
//! let done = engine.complete_transition(1, execution.id()).unwrap();
//!
//! assert_eq!(done.status(), ExecutionStatus::Completed);
//! assert_eq!(engine.record_state(1, 42).unwrap().current_state_id(), 2);
//! ```

pub mod clock;
pub mod condition;
pub mod definition;
pub mod engine;
pub mod execution;
pub mod repository;
pub mod sla;
pub mod tracker;

// Re-export the types most callers touch
pub use clock::{Clock, ManualClock, SystemClock};
pub use condition::{Condition, ConditionOperator};
pub use definition::{Blueprint, State, Transition};
pub use engine::{BlueprintEngine, EngineError};
pub use execution::{ExecutionStatus, TransitionExecution};
pub use sla::{Sla, SlaInstance, SlaStatus};
pub use tracker::RecordState;
