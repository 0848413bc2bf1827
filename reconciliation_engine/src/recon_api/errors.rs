use thiserror::Error;

use crate::db::traits::ReconciliationDbError;

/// Errors that stop a reconciliation run before any row or event is processed.
///
/// Failures of individual rows or events are never reported through this type. They are tallied in the run's result.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Project not found: {0}")]
    ProjectNotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] ReconciliationDbError),
}
