use cucumber::World;
use log::*;
use reconciliation_engine::{
    currency::CurrencyNormalizer,
    recon_api::{import_objects::CsvImportResult, options::ReconciliationOptions},
    test_utils::prepare_env::prepare_test_env,
    AccountingImportApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct LedgerWorld {
    pub system: Option<ReconciliationSystem>,
    pub project_id: String,
    pub last_result: Option<CsvImportResult>,
}

#[derive(Debug)]
pub struct ReconciliationSystem {
    pub db_path: String,
    pub api: AccountingImportApi<SqliteDatabase>,
}

impl LedgerWorld {
    pub fn api(&self) -> &AccountingImportApi<SqliteDatabase> {
        &self.system.as_ref().expect("AccountingImportApi not initialised").api
    }

    pub fn db(&self) -> &SqliteDatabase {
        self.api().db()
    }

    pub fn last_result(&self) -> &CsvImportResult {
        self.last_result.as_ref().expect("No import has run yet")
    }
}

impl ReconciliationSystem {
    pub async fn new() -> Self {
        let (url, db) = prepare_test_env().await;
        debug!("Created database: {url}");
        // small chunks, so that multi-order imports span several transactions
        let options = ReconciliationOptions::default().with_insert_chunk_size(5);
        let api = AccountingImportApi::new(db, CurrencyNormalizer::default(), options);
        Self { db_path: url, api }
    }
}
