use std::{collections::HashSet, fmt::Debug};

use log::*;
use serde_json::Value;

use crate::{
    currency::CurrencyNormalizer,
    db::traits::LedgerDatabase,
    precedence::{plan_accounting_events, AccountingPlan, ImportBatch, LedgerPrecedencePolicy, PrecedenceDecision},
    recon_api::{
        batch_report::{BatchTally, UnitOutcome},
        errors::ReconciliationError,
        import_objects::{AccountingImport, AccountingRow, CsvImportRequest, CsvImportResult, ImportTotals},
        options::ReconciliationOptions,
    },
};

/// `AccountingImportApi` reconciles rows of the accounting export into the ledger.
///
/// Every row is resolved to its order and run through the [`LedgerPrecedencePolicy`]. Orders that have not been
/// reconciled yet receive one accounting event per reported component, and are marked `accounting_complete`. Orders
/// that have are left alone, so the import is idempotent.
///
/// Rows never abort the batch. Each one ends up created, skipped as a duplicate, skipped as unresolvable, or failed,
/// and the result reports the tally.
pub struct AccountingImportApi<B> {
    db: B,
    normalizer: CurrencyNormalizer,
    options: ReconciliationOptions,
    policy: LedgerPrecedencePolicy,
}

impl<B> Debug for AccountingImportApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountingImportApi ({})", self.normalizer.settlement_currency())
    }
}

impl<B> AccountingImportApi<B> {
    pub fn new(db: B, normalizer: CurrencyNormalizer, options: ReconciliationOptions) -> Self {
        Self { db, normalizer, options, policy: LedgerPrecedencePolicy }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// What happened while planning one row.
enum RowPlan {
    Write(AccountingPlan),
    Settled(UnitOutcome),
}

impl<B> AccountingImportApi<B>
where B: LedgerDatabase
{
    /// Validates the request and imports its rows. Validation failures are returned before anything is written.
    pub async fn import(&self, request: CsvImportRequest) -> Result<CsvImportResult, ReconciliationError> {
        let import = AccountingImport::try_from(request)?;
        Ok(self.import_rows(import).await)
    }

    pub async fn import_rows(&self, import: AccountingImport) -> CsvImportResult {
        let batch = ImportBatch::new(import.project_id.clone(), import.reference_period);
        info!(
            "📥️ Importing {} accounting rows for project {} (period {}, batch {})",
            import.rows.len(),
            batch.project_id,
            batch.reference_period,
            batch.salt
        );
        let mut tally = BatchTally::default();
        let mut seen_orders = HashSet::new();
        let mut plans = Vec::new();
        for (index, row) in import.rows.iter().enumerate() {
            match self.plan_row(row, index, &batch, &mut seen_orders).await {
                RowPlan::Write(plan) => plans.push(plan),
                RowPlan::Settled(outcome) => tally.record(outcome),
            }
        }

        let mut result = CsvImportResult::default();
        let mut totals = ImportTotals::default();
        for chunk in chunk_plans(&plans, self.options.insert_chunk_size) {
            self.write_chunk(chunk, &mut tally, &mut result, &mut totals).await;
        }
        result.orders_processed = tally.created + tally.skipped_duplicate;
        result.orders_skipped_duplicate = tally.skipped_duplicate;
        result.rows_unresolved = tally.skipped_unresolvable;
        result.errors = tally.errors;
        result.totals = totals;
        info!(
            "📥️ Import batch {} complete. {} orders processed, {} ledger events created, {} orders completed, {} \
             errors",
            batch.salt,
            result.orders_processed,
            result.ledger_events_created,
            result.orders_updated_to_accounting_complete,
            result.errors.len()
        );
        result
    }

    async fn plan_row(
        &self,
        row: &Value,
        index: usize,
        batch: &ImportBatch,
        seen_orders: &mut HashSet<i64>,
    ) -> RowPlan {
        let row = match AccountingRow::from_json(row, index) {
            Ok(r) => r,
            Err(e) => {
                warn!("📥️ {e}");
                return RowPlan::Settled(UnitOutcome::Failed(e));
            },
        };
        let order = match self.db.fetch_order_by_transaction_id(&batch.project_id, &row.transaction_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                debug!("📥️ Row {index}: no order for {} in project {}", row.transaction_id, batch.project_id);
                return RowPlan::Settled(UnitOutcome::SkippedUnresolvable(row.transaction_id.0));
            },
            Err(e) => {
                let msg = format!("Row {index} ({}): could not look up order. {e}", row.transaction_id.as_str());
                warn!("📥️ {msg}");
                return RowPlan::Settled(UnitOutcome::Failed(msg));
            },
        };
        if !seen_orders.insert(order.id) {
            debug!("📥️ Row {index}: order {} appears more than once in this batch", order.transaction_id);
            return RowPlan::Settled(UnitOutcome::SkippedDuplicate);
        }
        match self.policy.evaluate(&self.db, &order).await {
            Ok(PrecedenceDecision::SkipAlreadyReconciled) => {
                debug!("📥️ Row {index}: order {} already has accounting events", order.transaction_id);
                RowPlan::Settled(UnitOutcome::SkippedDuplicate)
            },
            Ok(PrecedenceDecision::CreateAccountingEvents) => {
                match plan_accounting_events(&order, &row, index, batch, &self.normalizer) {
                    Ok(plan) => RowPlan::Write(plan),
                    Err(e) => RowPlan::Settled(UnitOutcome::Failed(e)),
                }
            },
            Err(e) => {
                let msg = format!(
                    "Row {index} ({}): could not check existing ledger events. {e}",
                    row.transaction_id.as_str()
                );
                warn!("📥️ {msg}");
                RowPlan::Settled(UnitOutcome::Failed(msg))
            },
        }
    }

    /// Writes one chunk atomically. If the chunk fails, every order in it is retried on its own so that one bad order
    /// cannot sink its neighbours.
    async fn write_chunk(
        &self,
        chunk: &[AccountingPlan],
        tally: &mut BatchTally,
        result: &mut CsvImportResult,
        totals: &mut ImportTotals,
    ) {
        let writes = chunk.iter().map(|p| p.write.clone()).collect::<Vec<_>>();
        match self.db.insert_accounting_writes(&writes).await {
            Ok(written) => {
                result.ledger_events_created += written.events_inserted;
                result.orders_updated_to_accounting_complete += written.orders_completed;
                for plan in chunk {
                    *totals += plan.totals;
                    tally.record(UnitOutcome::Created);
                }
            },
            Err(e) => {
                warn!("📥️ A chunk of {} orders could not be written ({e}). Retrying order by order.", chunk.len());
                for plan in chunk {
                    match self.db.insert_accounting_writes(std::slice::from_ref(&plan.write)).await {
                        Ok(written) => {
                            result.ledger_events_created += written.events_inserted;
                            result.orders_updated_to_accounting_complete += written.orders_completed;
                            *totals += plan.totals;
                            tally.record(UnitOutcome::Created);
                        },
                        Err(e) => {
                            let msg = format!(
                                "Row {} ({}): failed to write ledger events. {e}",
                                plan.row_index,
                                plan.write.transaction_id.as_str()
                            );
                            error!("📥️ {msg}");
                            tally.record(UnitOutcome::Failed(msg));
                        },
                    }
                }
            },
        }
    }
}

/// Splits plans into consecutive chunks holding at most `max_events` ledger events. A plan is never split across
/// chunks; a single plan larger than `max_events` gets a chunk of its own.
pub fn chunk_plans(plans: &[AccountingPlan], max_events: usize) -> Vec<&[AccountingPlan]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut events = 0;
    for (i, plan) in plans.iter().enumerate() {
        let n = plan.event_count();
        if i > start && events + n > max_events {
            chunks.push(&plans[start..i]);
            start = i;
            events = 0;
        }
        events += n;
    }
    if start < plans.len() {
        chunks.push(&plans[start..]);
    }
    chunks
}
