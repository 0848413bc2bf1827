//! # Reconciliation API
//!
//! The `recon_api` module exposes the programmatic entry points of the reconciliation engine.
//!
//! * [`csv_import_api`] folds rows of the monthly accounting export into the ledger, under the precedence rules of
//!   [`crate::precedence`].
//! * [`replay_api`] re-derives attribution and money fields from the raw webhook log and repairs the projections built
//!   from it.
//! * [`item_recovery_api`] re-classifies order items (main, order bump, upsell, downsell) from their source payloads.
//! * [`integrity_api`] reports on the consistency of the funnel and offer catalog.
//!
//! # API usage
//!
//! Every API is created by supplying a storage backend that implements the traits it needs, plus any immutable
//! configuration it uses:
//!
//! ```rust,ignore
//! use reconciliation_engine::{AccountingImportApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/reconciliation.db", 5).await?;
//! // SqliteDatabase implements LedgerDatabase
//! let api = AccountingImportApi::new(db, CurrencyNormalizer::default(), ReconciliationOptions::default());
//! let result = api.import(request).await?;
//! ```

pub mod batch_report;
pub mod csv_import_api;
pub mod errors;
pub mod import_objects;
pub mod integrity_api;
pub mod item_recovery_api;
pub mod options;
pub mod replay_api;
