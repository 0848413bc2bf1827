use chrono::{DateTime, Utc};
use mockall::mock;
use reconciliation_engine::{
    db_types::{
        ClassifiableItem,
        Funnel,
        ItemType,
        LedgerEvent,
        OfferMapping,
        Order,
        Project,
        ProjectId,
        ProjectLookup,
        RawEvent,
        SourceOrigin,
        TransactionId,
    },
    AccountingWrite,
    AccountingWriteResult,
    CatalogManagement,
    ItemManagement,
    LedgerDatabase,
    ReconciliationDbError,
    ReplayDatabase,
    ReplayUpdate,
};

mock! {
    pub Ledger {}
    impl LedgerDatabase for Ledger {
        async fn fetch_order_by_transaction_id(&self, project_id: &ProjectId, transaction_id: &TransactionId) -> Result<Option<Order>, ReconciliationDbError>;
        async fn has_ledger_events_from(&self, order_id: i64, origin: SourceOrigin) -> Result<bool, ReconciliationDbError>;
        async fn insert_accounting_writes(&self, writes: &[AccountingWrite]) -> Result<AccountingWriteResult, ReconciliationDbError>;
        async fn fetch_ledger_events_for_order(&self, order_id: i64) -> Result<Vec<LedgerEvent>, ReconciliationDbError>;
    }
}

mock! {
    pub RawEventLog {}
    impl ReplayDatabase for RawEventLog {
        async fn fetch_project(&self, lookup: &ProjectLookup) -> Result<Option<Project>, ReconciliationDbError>;
        async fn fetch_raw_events_since(&self, project_id: &ProjectId, since: DateTime<Utc>) -> Result<Vec<RawEvent>, ReconciliationDbError>;
        async fn update_order_projection(&self, update: &ReplayUpdate) -> Result<u64, ReconciliationDbError>;
        async fn update_sales_core_event(&self, update: &ReplayUpdate) -> Result<u64, ReconciliationDbError>;
        async fn update_ledger_attribution(&self, update: &ReplayUpdate) -> Result<u64, ReconciliationDbError>;
    }
}

mock! {
    pub ItemStore {}
    impl ItemManagement for ItemStore {
        async fn fetch_classifiable_items<'a>(&self, project_id: Option<&'a ProjectId>, after_id: i64, limit: u32) -> Result<Vec<ClassifiableItem>, ReconciliationDbError>;
        async fn update_item_type(&self, item_id: i64, item_type: ItemType) -> Result<bool, ReconciliationDbError>;
    }
}

mock! {
    pub Catalog {}
    impl CatalogManagement for Catalog {
        async fn fetch_funnels<'a>(&self, project_id: Option<&'a ProjectId>) -> Result<Vec<Funnel>, ReconciliationDbError>;
        async fn fetch_offer_mappings<'a>(&self, project_id: Option<&'a ProjectId>) -> Result<Vec<OfferMapping>, ReconciliationDbError>;
    }
}
