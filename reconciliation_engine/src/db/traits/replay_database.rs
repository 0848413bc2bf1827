use chrono::{DateTime, Utc};

use crate::{
    db::traits::{ReconciliationDbError, ReplayUpdate},
    db_types::{Project, ProjectId, ProjectLookup, RawEvent},
};

/// The storage behaviour required to replay the raw event log over the derived projections.
///
/// Each `update_*` method returns the number of rows it changed. Zero is not an error: a raw event may refer to a
/// transaction that was never projected into that table.
#[allow(async_fn_in_trait)]
pub trait ReplayDatabase {
    async fn fetch_project(&self, lookup: &ProjectLookup) -> Result<Option<Project>, ReconciliationDbError>;

    /// The project's raw events received at or after `since`, in ascending order of receipt.
    async fn fetch_raw_events_since(
        &self,
        project_id: &ProjectId,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, ReconciliationDbError>;

    /// Overwrites the attribution of the order projection, and its money fields with every value the event reported.
    /// Money fields of orders that are already `accounting_complete` are never touched.
    async fn update_order_projection(&self, update: &ReplayUpdate) -> Result<u64, ReconciliationDbError>;

    /// Overwrites the attribution of the sale event projection, and its gross value when the event reported one.
    async fn update_sales_core_event(&self, update: &ReplayUpdate) -> Result<u64, ReconciliationDbError>;

    /// Overwrites the attribution columns of the transaction's ledger events. No monetary column is written.
    async fn update_ledger_attribution(&self, update: &ReplayUpdate) -> Result<u64, ReconciliationDbError>;
}
