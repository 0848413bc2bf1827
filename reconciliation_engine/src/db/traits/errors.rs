use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconciliationDbError {
    #[error("Database driver error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Could not encode or decode a stored value: {0}")]
    DecodeError(String),
    #[error("Database query error: {0}")]
    QueryError(String),
}

impl From<serde_json::Error> for ReconciliationDbError {
    fn from(e: serde_json::Error) -> Self {
        ReconciliationDbError::DecodeError(e.to_string())
    }
}
