//! Errors for transition execution lifecycle operations.

use super::ExecutionStatus;
use thiserror::Error;

/// Raised when an execution operation is invoked from the wrong status.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("cannot {operation} an execution in status {status}")]
    InvalidStatus {
        operation: &'static str,
        status: ExecutionStatus,
    },
}
