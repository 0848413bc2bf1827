//! # Storage contracts
//!
//! The reconciliation APIs never talk to the datastore directly. Instead, each API is generic over a backend that
//! implements the traits in this module:
//!
//! * [`LedgerDatabase`] resolves orders and appends accounting events to the ledger. Used by the accounting import.
//! * [`ReplayDatabase`] reads the raw event log and rewrites the derived projections. Used by the raw-event replay.
//! * [`ItemManagement`] pages through order items together with the payload that produced them.
//! * [`CatalogManagement`] provides read access to the funnel/offer catalog.
//!
//! Every trait reports failures as [`ReconciliationDbError`].
mod catalog_management;
mod data_objects;
mod errors;
mod item_management;
mod ledger_database;
mod replay_database;

pub use catalog_management::CatalogManagement;
pub use data_objects::{AccountingWrite, AccountingWriteResult, ReplayUpdate};
pub use errors::ReconciliationDbError;
pub use item_management::ItemManagement;
pub use ledger_database::LedgerDatabase;
pub use replay_database::ReplayDatabase;
