use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use recon_common::SecretUrl;
use sqlx::SqlitePool;

use super::{
    catalog,
    ledger,
    new_pool,
    order_items,
    orders,
    projects,
    raw_events,
    run_migrations,
    sales_core_events,
};
use crate::{
    db::traits::{
        AccountingWrite,
        AccountingWriteResult,
        CatalogManagement,
        ItemManagement,
        LedgerDatabase,
        ReconciliationDbError,
        ReplayDatabase,
        ReplayUpdate,
    },
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
};

/// `SqliteDatabase` is the SQLite implementation of every storage trait in [`crate::db::traits`].
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, ReconciliationDbError> {
        trace!("🗃️ Creating new database connection pool with url {}", SecretUrl::new(url));
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), ReconciliationDbError> {
        run_migrations(&self.pool).await
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl LedgerDatabase for SqliteDatabase {
    async fn fetch_order_by_transaction_id(
        &self,
        project_id: &ProjectId,
        transaction_id: &TransactionId,
    ) -> Result<Option<Order>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_transaction_id(project_id, transaction_id, &mut conn).await
    }

    async fn has_ledger_events_from(&self, order_id: i64, origin: SourceOrigin) -> Result<bool, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        ledger::has_events_from(order_id, origin, &mut conn).await
    }

    async fn insert_accounting_writes(
        &self,
        writes: &[AccountingWrite],
    ) -> Result<AccountingWriteResult, ReconciliationDbError> {
        let mut tx = self.pool.begin().await?;
        let events = writes.iter().flat_map(|w| w.events.iter().cloned()).collect::<Vec<_>>();
        let events_inserted = ledger::insert_events(&events, &mut tx).await?;
        let mut orders_completed = 0;
        for write in writes {
            if orders::apply_ledger_advance(&write.advance, &mut tx).await? {
                orders_completed += 1;
            }
        }
        tx.commit().await?;
        debug!(
            "🗃️ Accounting chunk committed: {} orders, {events_inserted} ledger events, {orders_completed} orders \
             completed",
            writes.len()
        );
        Ok(AccountingWriteResult { events_inserted, orders_completed })
    }

    async fn fetch_ledger_events_for_order(&self, order_id: i64) -> Result<Vec<LedgerEvent>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_events_for_order(order_id, &mut conn).await
    }
}

impl ReplayDatabase for SqliteDatabase {
    async fn fetch_project(&self, lookup: &ProjectLookup) -> Result<Option<Project>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        projects::fetch_project(lookup, &mut conn).await
    }

    async fn fetch_raw_events_since(
        &self,
        project_id: &ProjectId,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        raw_events::fetch_raw_events_since(project_id, since, &mut conn).await
    }

    async fn update_order_projection(&self, update: &ReplayUpdate) -> Result<u64, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_projection(update, &mut conn).await
    }

    async fn update_sales_core_event(&self, update: &ReplayUpdate) -> Result<u64, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        sales_core_events::update_from_replay(update, &mut conn).await
    }

    async fn update_ledger_attribution(&self, update: &ReplayUpdate) -> Result<u64, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        ledger::update_attribution(update, &mut conn).await
    }
}

impl ItemManagement for SqliteDatabase {
    async fn fetch_classifiable_items(
        &self,
        project_id: Option<&ProjectId>,
        after_id: i64,
        limit: u32,
    ) -> Result<Vec<ClassifiableItem>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        order_items::fetch_classifiable_items(project_id, after_id, limit, &mut conn).await
    }

    async fn update_item_type(&self, item_id: i64, item_type: ItemType) -> Result<bool, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        order_items::update_item_type(item_id, item_type, &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_funnels(&self, project_id: Option<&ProjectId>) -> Result<Vec<Funnel>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_funnels(project_id, &mut conn).await
    }

    async fn fetch_offer_mappings(
        &self,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<OfferMapping>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_offer_mappings(project_id, &mut conn).await
    }
}
