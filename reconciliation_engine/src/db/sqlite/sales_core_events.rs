use sqlx::SqliteConnection;

use super::{bind_attribution, ATTRIBUTION_ASSIGNMENTS, ATTRIBUTION_COLUMNS};
use crate::{
    db::traits::{ReconciliationDbError, ReplayUpdate},
    db_types::{NewSalesCoreEvent, ProjectId, SalesCoreEvent, TransactionId},
};

pub async fn insert_sales_core_event(
    event: &NewSalesCoreEvent,
    conn: &mut SqliteConnection,
) -> Result<i64, ReconciliationDbError> {
    let sql = format!(
        "INSERT INTO sales_core_events (project_id, provider_event_id, transaction_id, gross_brl, occurred_at, \
         {ATTRIBUTION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING id"
    );
    let query = sqlx::query(&sql)
        .bind(event.project_id.as_str())
        .bind(event.provider_event_id.as_str())
        .bind(event.transaction_id.as_str())
        .bind(event.gross_brl)
        .bind(event.occurred_at);
    let row = bind_attribution(query, &event.attribution).fetch_one(conn).await?;
    let id = sqlx::Row::try_get(&row, "id")?;
    Ok(id)
}

pub async fn fetch_for_transaction(
    project_id: &ProjectId,
    transaction_id: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Vec<SalesCoreEvent>, ReconciliationDbError> {
    let events = sqlx::query_as(
        "SELECT * FROM sales_core_events WHERE project_id = $1 AND transaction_id = $2 ORDER BY id ASC",
    )
    .bind(project_id.as_str())
    .bind(transaction_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(events)
}

/// Overwrites the attribution of a transaction's sale events, and its gross value when the replay reported one.
pub async fn update_from_replay(
    update: &ReplayUpdate,
    conn: &mut SqliteConnection,
) -> Result<u64, ReconciliationDbError> {
    let sql = format!(
        "UPDATE sales_core_events SET {ATTRIBUTION_ASSIGNMENTS}, gross_brl = COALESCE($12, gross_brl), updated_at = \
         CURRENT_TIMESTAMP WHERE project_id = $1 AND transaction_id = $2"
    );
    let query = sqlx::query(&sql).bind(update.project_id.as_str()).bind(update.transaction_id.as_str());
    let result = bind_attribution(query, &update.attribution).bind(update.gross_brl).execute(conn).await?;
    Ok(result.rows_affected())
}
