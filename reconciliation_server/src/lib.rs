//! # Reconciliation server
//! This crate hosts the HTTP front end of the reconciliation engine. It is responsible for:
//! * Receiving accounting exports and folding them into the ledger.
//! * Triggering repairs of the derived projections from the raw event log.
//! * Re-classifying order items, and reporting on the consistency of the offer catalog.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /reconcile/csv_import`: Imports rows of the accounting export.
//! * `POST /reconcile/replay_raw_events`: Replays the recent raw events of a project over its projections.
//! * `POST /reconcile/recover_item_types`: Re-classifies order items from their source payloads.
//! * `GET /diagnostics/funnel_offers`: Reports on the integrity of the funnel and offer catalog.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
