use crate::{
    db::traits::{AccountingWrite, AccountingWriteResult, ReconciliationDbError},
    db_types::{LedgerEvent, Order, ProjectId, SourceOrigin, TransactionId},
};

/// The storage behaviour required to reconcile accounting exports into the ledger.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase {
    /// Fetches the order of `project_id` with the given provider transaction id.
    async fn fetch_order_by_transaction_id(
        &self,
        project_id: &ProjectId,
        transaction_id: &TransactionId,
    ) -> Result<Option<Order>, ReconciliationDbError>;

    /// Returns true if the order already has at least one ledger event from the given source.
    async fn has_ledger_events_from(&self, order_id: i64, origin: SourceOrigin) -> Result<bool, ReconciliationDbError>;

    /// Writes a chunk of accounting writes in a single atomic transaction.
    ///
    /// Events whose `provider_event_id` already exists are silently skipped. For every write, the order's totals are
    /// updated with the non-null amounts of its [`crate::db_types::LedgerAdvance`] and its status is set to
    /// `accounting_complete`. Either the whole chunk is written, or nothing is.
    async fn insert_accounting_writes(
        &self,
        writes: &[AccountingWrite],
    ) -> Result<AccountingWriteResult, ReconciliationDbError>;

    /// All ledger events of an order, oldest first.
    async fn fetch_ledger_events_for_order(&self, order_id: i64) -> Result<Vec<LedgerEvent>, ReconciliationDbError>;
}
