use std::ops::AddAssign;

use chrono::{Datelike, NaiveDate};
use recon_common::Money;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{ProjectId, TransactionId},
    helpers::payload::{decimal_at, lookup, str_at, text_at},
    recon_api::errors::ReconciliationError,
};

//--------------------------------------   CsvImportRequest   ---------------------------------------------------------
/// The body of an accounting import request, as it arrives on the wire.
///
/// Every field is optional at this level so that missing fields can be reported as validation errors rather than
/// deserialization failures. Rows are kept as raw JSON and parsed one at a time, so a single malformed row never
/// rejects the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvImportRequest {
    pub project_id: Option<String>,
    pub rows: Option<Vec<Value>>,
    pub reference_period: Option<String>,
}

/// A validated accounting import.
#[derive(Debug, Clone)]
pub struct AccountingImport {
    pub project_id: ProjectId,
    pub rows: Vec<Value>,
    /// Always the first day of the accounting month
    pub reference_period: NaiveDate,
}

impl TryFrom<CsvImportRequest> for AccountingImport {
    type Error = ReconciliationError;

    fn try_from(req: CsvImportRequest) -> Result<Self, Self::Error> {
        let project_id = req
            .project_id
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ReconciliationError::InvalidRequest("project_id is required".into()))?;
        let rows = req
            .rows
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ReconciliationError::InvalidRequest("rows must be a non-empty array".into()))?;
        let period = req
            .reference_period
            .ok_or_else(|| ReconciliationError::InvalidRequest("reference_period is required".into()))?;
        let reference_period = parse_reference_period(&period)?;
        Ok(Self { project_id: ProjectId::from(project_id), rows, reference_period })
    }
}

/// Parses an accounting month. Accepts `YYYY-MM`, `YYYY-MM-DD` and ISO-8601 timestamps; the day is discarded.
pub fn parse_reference_period(s: &str) -> Result<NaiveDate, ReconciliationError> {
    let s = s.trim();
    let invalid = || ReconciliationError::InvalidRequest(format!("reference_period '{s}' is not a valid month"));
    let date = match s.len() {
        7 => NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").map_err(|_| invalid())?,
        n if n >= 10 => {
            let day = s.get(..10).ok_or_else(invalid)?;
            NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| invalid())?
        },
        _ => return Err(invalid()),
    };
    date.with_day(1).ok_or_else(invalid)
}

//--------------------------------------    AccountingRow     ---------------------------------------------------------
/// The largest magnitude, in major units, that any amount on an accounting row may have.
pub const MAX_ROW_AMOUNT: f64 = 1e12;

/// One line of the accounting export. Amounts are in the row's original currency, except for `net_value_brl`, which
/// the export has already converted.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountingRow {
    pub transaction_id: TransactionId,
    pub gross_value: f64,
    pub net_value: f64,
    pub net_value_brl: f64,
    pub platform_fee: Option<f64>,
    pub affiliate_commission: Option<f64>,
    pub coproducer_commission: Option<f64>,
    pub taxes: Option<f64>,
    pub original_currency: Option<String>,
    pub exchange_rate: Option<f64>,
    pub sale_date: Option<String>,
}

impl AccountingRow {
    /// Reads a row. The error message names the row and, when available, its transaction id.
    pub fn from_json(row: &Value, index: usize) -> Result<Self, String> {
        if !row.is_object() {
            return Err(format!("Row {index}: expected an object"));
        }
        let transaction_id =
            text_at(row, &["transaction_id"]).ok_or_else(|| format!("Row {index}: missing transaction_id"))?;
        let in_range = |field: &str, value: f64| {
            if value.abs() > MAX_ROW_AMOUNT {
                Err(format!("Row {index} ({transaction_id}): {field} is out of range"))
            } else {
                Ok(value)
            }
        };
        let required = |field: &str| {
            match lookup(row, &[field]) {
                None => Err(format!("Row {index} ({transaction_id}): missing {field}")),
                Some(_) => decimal_at(row, &[field])
                    .ok_or_else(|| format!("Row {index} ({transaction_id}): {field} is not a number"))
                    .and_then(|v| in_range(field, v)),
            }
        };
        let optional = |field: &str| decimal_at(row, &[field]).map(|v| in_range(field, v)).transpose();
        let gross_value = required("gross_value")?;
        let net_value = required("net_value")?;
        let net_value_brl = required("net_value_brl")?;
        Ok(Self {
            gross_value,
            net_value,
            net_value_brl,
            platform_fee: optional("platform_fee")?,
            affiliate_commission: optional("affiliate_commission")?,
            coproducer_commission: optional("coproducer_commission")?,
            taxes: optional("taxes")?,
            original_currency: str_at(row, &["original_currency"]).map(|c| c.trim().to_ascii_uppercase()),
            exchange_rate: decimal_at(row, &["exchange_rate"]).filter(|r| *r > 0.0),
            sale_date: text_at(row, &["sale_date"]),
            transaction_id: TransactionId::from(transaction_id),
        })
    }
}

//--------------------------------------     ImportTotals     ---------------------------------------------------------
/// Settlement-currency totals over the orders committed by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTotals {
    pub producer_net_brl: Money,
    pub platform_fee_brl: Money,
    pub affiliate_brl: Money,
    pub coproducer_brl: Money,
    pub tax_brl: Money,
}

/// Totals saturate at the bounds of [`Money`] instead of overflowing.
impl AddAssign for ImportTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.producer_net_brl = self.producer_net_brl.saturating_add(rhs.producer_net_brl);
        self.platform_fee_brl = self.platform_fee_brl.saturating_add(rhs.platform_fee_brl);
        self.affiliate_brl = self.affiliate_brl.saturating_add(rhs.affiliate_brl);
        self.coproducer_brl = self.coproducer_brl.saturating_add(rhs.coproducer_brl);
        self.tax_brl = self.tax_brl.saturating_add(rhs.tax_brl);
    }
}

//--------------------------------------    CsvImportResult   ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvImportResult {
    /// Rows whose order was found, whether or not new events were created for it
    pub orders_processed: u64,
    pub ledger_events_created: u64,
    pub orders_updated_to_accounting_complete: u64,
    /// Orders that already carried accounting events and were left untouched
    pub orders_skipped_duplicate: u64,
    /// Rows whose transaction id does not match any order of the project
    pub rows_unresolved: u64,
    pub errors: Vec<String>,
    pub totals: ImportTotals,
}
