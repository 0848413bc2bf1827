//! # SQLite backend
//!
//! The submodules contain "low-level" SQLite interactions. They are plain functions (rather than methods on stateful
//! structs) that accept a `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open an
//! atomic transaction and pass `&mut tx` as the connection, without any other changes.
//!
//! [`SqliteDatabase`] composes these functions to implement the storage traits.
mod db;

pub mod catalog;
pub mod ledger;
pub mod order_items;
pub mod orders;
pub mod projects;
pub mod raw_events;
pub mod sales_core_events;

use std::str::FromStr;

pub use db::SqliteDatabase;
use log::info;
use sqlx::{
    migrate::Migrator,
    query::Query,
    sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions},
    Sqlite,
    SqlitePool,
};

use crate::{attribution::Attribution, db::traits::ReconciliationDbError};

pub static MIGRATOR: Migrator = sqlx::migrate!("./src/db/sqlite/migrations");

/// The attribution columns, in the order [`bind_attribution`] binds them.
pub(crate) const ATTRIBUTION_COLUMNS: &str = "raw_sck, utm_source, utm_medium, utm_campaign, utm_term, utm_content, \
                                              meta_campaign_id, meta_adset_id, meta_ad_id";

/// `SET` clause overwriting every attribution column, with parameters `$3`..`$11`. Statements using it bind the
/// project id as `$1` and the transaction id as `$2`.
pub(crate) const ATTRIBUTION_ASSIGNMENTS: &str = "raw_sck = $3, utm_source = $4, utm_medium = $5, utm_campaign = $6, \
                                                  utm_term = $7, utm_content = $8, meta_campaign_id = $9, \
                                                  meta_adset_id = $10, meta_ad_id = $11";

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

pub(crate) fn bind_attribution<'q>(query: SqliteQuery<'q>, a: &'q Attribution) -> SqliteQuery<'q> {
    query
        .bind(a.raw_sck.as_deref())
        .bind(a.utm_source.as_deref())
        .bind(a.utm_medium.as_deref())
        .bind(a.utm_campaign.as_deref())
        .bind(a.utm_term.as_deref())
        .bind(a.utm_content.as_deref())
        .bind(a.meta_campaign_id.as_deref())
        .bind(a.meta_adset_id.as_deref())
        .bind(a.meta_ad_id.as_deref())
}

/// Creates a connection pool. The database file is created if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, ReconciliationDbError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), ReconciliationDbError> {
    MIGRATOR.run(pool).await?;
    info!("🗃️ Database migrations complete");
    Ok(())
}
