//! Errors for SLA instance lifecycle operations.

use super::SlaInstanceStatus;
use thiserror::Error;

/// Errors raised when finalizing an SLA instance.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlaError {
    #[error("SLA instance is not active (status: {0})")]
    NotActive(SlaInstanceStatus),
}
