use recon_common::Money;

use crate::{
    attribution::Attribution,
    db_types::{LedgerAdvance, NewLedgerEvent, ProjectId, TransactionId},
    financials::FinancialBreakdown,
};

/// Everything that must be written, atomically, to reconcile one order against the accounting export.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountingWrite {
    pub transaction_id: TransactionId,
    pub events: Vec<NewLedgerEvent>,
    pub advance: LedgerAdvance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountingWriteResult {
    /// Events actually inserted. Events whose `provider_event_id` already existed are not counted.
    pub events_inserted: u64,
    /// Orders whose status moved to `accounting_complete`
    pub orders_completed: u64,
}

/// Values re-derived from a raw event, to be written back over the projections of its transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayUpdate {
    pub project_id: ProjectId,
    pub transaction_id: TransactionId,
    pub attribution: Attribution,
    /// Gross sale value in the settlement currency, if the payload reported a price
    pub gross_brl: Option<Money>,
    /// Commission split, already converted to the settlement currency
    pub breakdown: FinancialBreakdown,
}
