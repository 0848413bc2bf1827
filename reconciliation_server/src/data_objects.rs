use reconciliation_engine::{
    integrity::CatalogReport,
    recon_api::{import_objects::CsvImportResult, item_recovery_api::ItemRecoveryResult, replay_api::ReplayResult},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectQuery {
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvImportResponse {
    pub success: bool,
    pub result: CsvImportResult,
}

impl From<CsvImportResult> for CsvImportResponse {
    fn from(result: CsvImportResult) -> Self {
        Self { success: true, result }
    }
}

/// The replay counters, flattened next to the `success` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: ReplayResult,
}

impl From<ReplayResult> for ReplayResponse {
    fn from(result: ReplayResult) -> Self {
        Self { success: true, result }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecoveryResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: ItemRecoveryResult,
}

impl From<ItemRecoveryResult> for ItemRecoveryResponse {
    fn from(result: ItemRecoveryResult) -> Self {
        Self { success: true, result }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogReportResponse {
    pub success: bool,
    pub report: CatalogReport,
}

impl From<CatalogReport> for CatalogReportResponse {
    fn from(report: CatalogReport) -> Self {
        Self { success: true, report }
    }
}
