use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::traits::ReconciliationDbError,
    db_types::{ProjectId, RawEvent},
};

/// Archives a provider notification. This is the ingestion path's job; the reconciliation core never calls it outside
/// of tests and fixtures.
pub async fn insert_raw_event(event: &RawEvent, conn: &mut SqliteConnection) -> Result<(), ReconciliationDbError> {
    sqlx::query("INSERT INTO raw_events (id, project_id, provider, payload, received_at) VALUES ($1, $2, $3, $4, $5)")
        .bind(event.id.as_str())
        .bind(event.project_id.as_str())
        .bind(event.provider.as_str())
        .bind(event.payload.as_str())
        .bind(event.received_at)
        .execute(conn)
        .await?;
    trace!("🗃️ Raw event {} archived", event.id);
    Ok(())
}

/// Timestamps are compared with `julianday` so that rows written with SQLite's `CURRENT_TIMESTAMP` format and rows
/// written with RFC 3339 timestamps order correctly against each other.
pub async fn fetch_raw_events_since(
    project_id: &ProjectId,
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<RawEvent>, ReconciliationDbError> {
    let events = sqlx::query_as(
        r#"
        SELECT id, project_id, provider, payload, received_at
        FROM raw_events
        WHERE project_id = $1 AND julianday(received_at) >= julianday($2)
        ORDER BY julianday(received_at) ASC, id ASC
        "#,
    )
    .bind(project_id.as_str())
    .bind(since)
    .fetch_all(conn)
    .await?;
    Ok(events)
}
