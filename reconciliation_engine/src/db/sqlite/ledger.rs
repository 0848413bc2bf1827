use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{bind_attribution, ATTRIBUTION_ASSIGNMENTS};
use crate::{
    db::traits::{ReconciliationDbError, ReplayUpdate},
    db_types::{LedgerEvent, NewLedgerEvent, SourceOrigin},
};

pub async fn has_events_from(
    order_id: i64,
    origin: SourceOrigin,
    conn: &mut SqliteConnection,
) -> Result<bool, ReconciliationDbError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM finance_ledger WHERE order_id = $1 AND source_origin = $2)")
            .bind(order_id)
            .bind(origin)
            .fetch_one(conn)
            .await?;
    Ok(exists)
}

/// Appends events to the ledger in a single statement. Events whose `provider_event_id` already exists are skipped.
///
/// Returns the number of events actually inserted.
pub async fn insert_events(
    events: &[NewLedgerEvent],
    conn: &mut SqliteConnection,
) -> Result<u64, ReconciliationDbError> {
    if events.is_empty() {
        return Ok(0);
    }
    let provenance = events.iter().map(|e| serde_json::to_string(&e.provenance)).collect::<Result<Vec<_>, _>>()?;
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "INSERT INTO finance_ledger (project_id, order_id, transaction_id, provider, provider_event_id, \
         source_origin, confidence_level, event_type, actor_role, amount_brl, amount_accounting, accounting_currency, \
         reference_period, provenance, raw_sck, utm_source, utm_medium, utm_campaign, utm_term, utm_content, \
         meta_campaign_id, meta_adset_id, meta_ad_id) ",
    );
    builder.push_values(events.iter().zip(provenance.iter()), |mut b, (event, provenance)| {
        let a = &event.attribution;
        b.push_bind(event.project_id.as_str())
            .push_bind(event.order_id)
            .push_bind(event.transaction_id.as_str())
            .push_bind(event.provider.as_str())
            .push_bind(event.provider_event_id.as_str())
            .push_bind(event.source_origin)
            .push_bind(event.confidence_level)
            .push_bind(event.event_type)
            .push_bind(event.actor_role)
            .push_bind(event.amount_brl)
            .push_bind(event.amount_accounting)
            .push_bind(event.accounting_currency.as_str())
            .push_bind(event.reference_period)
            .push_bind(provenance.as_str())
            .push_bind(a.raw_sck.as_deref())
            .push_bind(a.utm_source.as_deref())
            .push_bind(a.utm_medium.as_deref())
            .push_bind(a.utm_campaign.as_deref())
            .push_bind(a.utm_term.as_deref())
            .push_bind(a.utm_content.as_deref())
            .push_bind(a.meta_campaign_id.as_deref())
            .push_bind(a.meta_adset_id.as_deref())
            .push_bind(a.meta_ad_id.as_deref());
    });
    builder.push(" ON CONFLICT (provider_event_id) DO NOTHING");
    let result = builder.build().execute(conn).await?;
    let inserted = result.rows_affected();
    trace!("🗃️ {inserted} of {} ledger events inserted", events.len());
    Ok(inserted)
}

pub async fn fetch_events_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEvent>, ReconciliationDbError> {
    let events = sqlx::query_as("SELECT * FROM finance_ledger WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(events)
}

/// Overwrites the attribution columns of every ledger event of a transaction. Monetary columns are immutable and the
/// schema rejects any attempt to change them.
pub async fn update_attribution(
    update: &ReplayUpdate,
    conn: &mut SqliteConnection,
) -> Result<u64, ReconciliationDbError> {
    let sql =
        format!("UPDATE finance_ledger SET {ATTRIBUTION_ASSIGNMENTS} WHERE project_id = $1 AND transaction_id = $2");
    let query = sqlx::query(&sql).bind(update.project_id.as_str()).bind(update.transaction_id.as_str());
    let result = bind_attribution(query, &update.attribution).execute(conn).await?;
    Ok(result.rows_affected())
}
