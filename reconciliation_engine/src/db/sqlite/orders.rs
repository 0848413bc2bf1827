use log::{debug, trace};
use sqlx::SqliteConnection;

use super::{bind_attribution, ATTRIBUTION_ASSIGNMENTS, ATTRIBUTION_COLUMNS};
use crate::{
    db::traits::{ReconciliationDbError, ReplayUpdate},
    db_types::{LedgerAdvance, LedgerStatus, NewOrder, Order, ProjectId, TransactionId},
};

/// Inserts a new order projection. Order projections are created by the ingestion path; the reconciliation core only
/// calls this from tests and fixtures.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, ReconciliationDbError> {
    let sql = format!(
        r#"
        INSERT INTO orders (
            project_id, transaction_id, provider, gross_brl, producer_net_brl, ledger_status, {ATTRIBUTION_COLUMNS}
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING *
        "#
    );
    let query = sqlx::query(&sql)
        .bind(order.project_id.as_str())
        .bind(order.transaction_id.as_str())
        .bind(order.provider.as_str())
        .bind(order.gross_brl)
        .bind(order.producer_net_brl)
        .bind(order.ledger_status);
    let row = bind_attribution(query, &order.attribution).fetch_one(&mut *conn).await?;
    let order: Order = sqlx::FromRow::from_row(&row)?;
    debug!("🗃️ Order {} inserted with id {}", order.transaction_id, order.id);
    Ok(order)
}

pub async fn fetch_order_by_transaction_id(
    project_id: &ProjectId,
    transaction_id: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, ReconciliationDbError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE project_id = $1 AND transaction_id = $2")
        .bind(project_id.as_str())
        .bind(transaction_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Writes the accounting totals of an order and marks it as `accounting_complete`.
///
/// Only reported (non-null) totals are written. Returns true if the order's status changed as a result, i.e. it was
/// not already `accounting_complete`.
pub async fn apply_ledger_advance(
    advance: &LedgerAdvance,
    conn: &mut SqliteConnection,
) -> Result<bool, ReconciliationDbError> {
    let current: Option<LedgerStatus> = sqlx::query_scalar(
        r#"
        UPDATE orders SET
            gross_brl = COALESCE($2, gross_brl),
            producer_net_brl = COALESCE($3, producer_net_brl),
            platform_fee_brl = COALESCE($4, platform_fee_brl),
            affiliate_brl = COALESCE($5, affiliate_brl),
            coproducer_brl = COALESCE($6, coproducer_brl),
            tax_brl = COALESCE($7, tax_brl),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING ledger_status
        "#,
    )
    .bind(advance.order_id)
    .bind(advance.gross_brl)
    .bind(advance.producer_net_brl)
    .bind(advance.platform_fee_brl)
    .bind(advance.affiliate_brl)
    .bind(advance.coproducer_brl)
    .bind(advance.tax_brl)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(current) = current else {
        return Err(ReconciliationDbError::QueryError(format!("Order id {} does not exist", advance.order_id)));
    };
    let next = current.advance_to(LedgerStatus::AccountingComplete);
    let changed = next != current;
    if changed {
        sqlx::query("UPDATE orders SET ledger_status = $2 WHERE id = $1")
            .bind(advance.order_id)
            .bind(next)
            .execute(conn)
            .await?;
    }
    trace!("🗃️ Accounting totals written for order id {}. Status changed: {changed}", advance.order_id);
    Ok(changed)
}

/// Rewrites the derived fields of an order projection from a replayed raw event.
///
/// Attribution is always overwritten. Money fields are overwritten with every reported (non-null) value, unless the
/// order is already `accounting_complete`, in which case the accounting figures stand. A `pending` order with a known
/// producer net advances to `realtime_complete`.
pub async fn update_order_projection(
    update: &ReplayUpdate,
    conn: &mut SqliteConnection,
) -> Result<u64, ReconciliationDbError> {
    let sql = format!(
        r#"
        UPDATE orders SET
            {ATTRIBUTION_ASSIGNMENTS},
            gross_brl = CASE WHEN ledger_status = 'accounting_complete' THEN gross_brl
                ELSE COALESCE($12, gross_brl) END,
            producer_net_brl = CASE WHEN ledger_status = 'accounting_complete' THEN producer_net_brl
                ELSE COALESCE($13, producer_net_brl) END,
            platform_fee_brl = CASE WHEN ledger_status = 'accounting_complete' THEN platform_fee_brl
                ELSE COALESCE($14, platform_fee_brl) END,
            affiliate_brl = CASE WHEN ledger_status = 'accounting_complete' THEN affiliate_brl
                ELSE COALESCE($15, affiliate_brl) END,
            coproducer_brl = CASE WHEN ledger_status = 'accounting_complete' THEN coproducer_brl
                ELSE COALESCE($16, coproducer_brl) END,
            ledger_status = CASE WHEN ledger_status = 'pending' AND COALESCE($13, producer_net_brl) IS NOT NULL
                THEN 'realtime_complete' ELSE ledger_status END,
            updated_at = CURRENT_TIMESTAMP
        WHERE project_id = $1 AND transaction_id = $2
        "#
    );
    let query = sqlx::query(&sql).bind(update.project_id.as_str()).bind(update.transaction_id.as_str());
    let b = &update.breakdown;
    let result = bind_attribution(query, &update.attribution)
        .bind(update.gross_brl)
        .bind(b.producer_net)
        .bind(b.platform_fee)
        .bind(b.affiliate)
        .bind(b.coproducer)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
