//! Reconciliation Engine
//!
//! The reconciliation engine keeps a commerce ledger consistent when the same sale is reported by two sources: the
//! realtime webhook stream of the sales platform, and the monthly accounting export. Accounting figures always win.
//!
//! The library is divided into three main sections:
//! 1. Pure components: the attribution parser ([`mod@attribution`]), the financial breakdown extractor
//!    ([`mod@financials`]), the currency normalizer ([`mod@currency`]), the item classifier ([`mod@classification`]),
//!    the precedence policy ([`mod@precedence`]) and the catalog report ([`mod@integrity`]).
//! 2. Storage ([`mod@db`]). The storage traits describe what each API needs; SQLite is the supported backend. The
//!    data types stored in the database are defined in [`mod@db_types`] and are public.
//! 3. The reconciliation API ([`mod@recon_api`]). Clients construct an API over a backend and call it.
pub mod attribution;
pub mod classification;
pub mod currency;
pub mod db;
pub mod db_types;
pub mod financials;
pub mod helpers;
pub mod integrity;
pub mod precedence;
pub mod recon_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits::{
    AccountingWrite,
    AccountingWriteResult,
    CatalogManagement,
    ItemManagement,
    LedgerDatabase,
    ReconciliationDbError,
    ReplayDatabase,
    ReplayUpdate,
};
pub use recon_api::{
    csv_import_api::AccountingImportApi,
    errors::ReconciliationError,
    integrity_api::CatalogIntegrityApi,
    item_recovery_api::ItemRecoveryApi,
    replay_api::RawEventReplayApi,
};
