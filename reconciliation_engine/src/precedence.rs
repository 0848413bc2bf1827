//! # Ledger precedence
//!
//! Two sources report the money of every sale. The webhook stream is fast but incomplete, and the accounting export is
//! late but authoritative. Both are kept: accounting events are appended next to the real-time ones and never replace
//! them. Consumers prefer `accounting` confidence over `realtime` at read time.
//!
//! The write-time rule is simple. An order receives accounting events at most once. If it already has any event of
//! [`SourceOrigin::Csv`] origin, the order is skipped, so importing the same export twice, or two overlapping exports,
//! never double-counts.
//!
//! Within a batch, every event is identified by `csv:{batch salt}:{event type}:{transaction id}`. The salt is unique
//! per import, so logically identical rows in two different imports never collide on the ledger's unique key. The
//! precedence check above is what prevents them from being written twice.
use chrono::{DateTime, NaiveDate, Utc};
use log::trace;
use rand::Rng;
use recon_common::Money;
use serde_json::json;

use crate::{
    currency::CurrencyNormalizer,
    db::traits::{AccountingWrite, LedgerDatabase, ReconciliationDbError},
    db_types::{
        ConfidenceLevel,
        LedgerAdvance,
        LedgerEventType,
        NewLedgerEvent,
        Order,
        ProjectId,
        SourceOrigin,
    },
    recon_api::import_objects::{AccountingRow, ImportTotals},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecedenceDecision {
    /// The order has no accounting events yet. Its full set of accounting events may be created.
    CreateAccountingEvents,
    /// The order was already reconciled against an accounting export. Nothing may be written for it.
    SkipAlreadyReconciled,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerPrecedencePolicy;

impl LedgerPrecedencePolicy {
    pub fn decide(&self, has_accounting_events: bool) -> PrecedenceDecision {
        if has_accounting_events {
            PrecedenceDecision::SkipAlreadyReconciled
        } else {
            PrecedenceDecision::CreateAccountingEvents
        }
    }

    /// Performs the existence check for `order` and returns the decision.
    pub async fn evaluate<B: LedgerDatabase>(
        &self,
        db: &B,
        order: &Order,
    ) -> Result<PrecedenceDecision, ReconciliationDbError> {
        let existing = db.has_ledger_events_from(order.id, SourceOrigin::Csv).await?;
        let decision = self.decide(existing);
        trace!("📥️ Precedence for order {}: {decision:?}", order.transaction_id);
        Ok(decision)
    }
}

//--------------------------------------     ImportBatch      ---------------------------------------------------------
/// Identity of one run of the accounting import.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub project_id: ProjectId,
    pub reference_period: NaiveDate,
    pub imported_at: DateTime<Utc>,
    pub salt: String,
}

impl ImportBatch {
    pub fn new(project_id: ProjectId, reference_period: NaiveDate) -> Self {
        let imported_at = Utc::now();
        let salt = format!("{}{:06x}", imported_at.timestamp_millis(), rand::thread_rng().gen::<u32>() & 0xff_ffff);
        Self { project_id, reference_period, imported_at, salt }
    }

    pub fn with_salt<S: Into<String>>(mut self, salt: S) -> Self {
        self.salt = salt.into();
        self
    }

    pub fn provider_event_id(&self, event_type: LedgerEventType, transaction_id: &str) -> String {
        format!("csv:{}:{event_type}:{transaction_id}", self.salt)
    }
}

//--------------------------------------   AccountingPlan     ---------------------------------------------------------
/// The accounting events of one export row, and the order-level changes they imply.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountingPlan {
    pub row_index: usize,
    pub write: AccountingWrite,
    pub totals: ImportTotals,
}

impl AccountingPlan {
    pub fn event_count(&self) -> usize {
        self.write.events.len()
    }
}

fn to_money(value: f64, field: &str, row: &AccountingRow, index: usize) -> Result<Money, String> {
    Money::try_from(value).map_err(|e| format!("Row {index} ({}): invalid {field}. {e}", row.transaction_id.as_str()))
}

/// Derives the accounting events for one export row.
///
/// One event is produced per reported, non-zero component: the sale (the producer's net, already in the settlement
/// currency), the platform fee, the affiliate and co-producer commissions, and taxes. Components in a foreign currency
/// are converted using the row's own exchange rate when present, or the normalizer's table otherwise. The amount as
/// reported is kept on every event.
pub fn plan_accounting_events(
    order: &Order,
    row: &AccountingRow,
    row_index: usize,
    batch: &ImportBatch,
    normalizer: &CurrencyNormalizer,
) -> Result<AccountingPlan, String> {
    let currency = row.original_currency.clone().unwrap_or_else(|| normalizer.settlement_currency().to_string());
    let net_brl = to_money(row.net_value_brl, "net_value_brl", row, row_index)?;
    let net = to_money(row.net_value, "net_value", row, row_index)?;
    let gross = to_money(row.gross_value, "gross_value", row, row_index)?;
    let gross_brl = normalizer.normalize_with_rate(gross, &currency, row.exchange_rate).settlement_amount;

    let mut events = Vec::with_capacity(5);
    let mut push_event = |event_type: LedgerEventType, amount_brl: Money, original: Money, rate: f64, fallback: bool| {
        if amount_brl.is_zero() {
            return;
        }
        events.push(NewLedgerEvent {
            project_id: order.project_id.clone(),
            order_id: order.id,
            transaction_id: order.transaction_id.clone(),
            provider: order.provider.clone(),
            provider_event_id: batch.provider_event_id(event_type, row.transaction_id.as_str()),
            source_origin: SourceOrigin::Csv,
            confidence_level: ConfidenceLevel::Accounting,
            event_type,
            actor_role: event_type.actor(),
            amount_brl,
            amount_accounting: original,
            accounting_currency: currency.clone(),
            reference_period: Some(batch.reference_period),
            provenance: json!({
                "source": "accounting_csv",
                "transaction_id": row.transaction_id.as_str(),
                "row_index": row_index,
                "import_batch": batch.salt,
                "imported_at": batch.imported_at.to_rfc3339(),
                "sale_date": row.sale_date,
                "gross_value": row.gross_value,
                "exchange_rate": rate,
                "rate_fallback": fallback,
            }),
            attribution: order.attribution.clone(),
        });
    };

    let explicit_rate = if net.is_zero() { None } else { Some(net_brl.to_decimal() / net.to_decimal()) };
    push_event(LedgerEventType::Sale, net_brl, net, row.exchange_rate.or(explicit_rate).unwrap_or(1.0), false);

    let mut convert = |event_type: LedgerEventType, value: Option<f64>, field: &str| -> Result<Option<Money>, String> {
        let Some(value) = value else {
            return Ok(None);
        };
        let original = to_money(value, field, row, row_index)?;
        let n = normalizer.normalize_with_rate(original, &currency, row.exchange_rate);
        push_event(event_type, n.settlement_amount, original, n.rate, n.used_fallback);
        Ok(Some(n.settlement_amount))
    };
    let platform_fee = convert(LedgerEventType::PlatformFee, row.platform_fee, "platform_fee")?;
    let affiliate = convert(LedgerEventType::Affiliate, row.affiliate_commission, "affiliate_commission")?;
    let coproducer = convert(LedgerEventType::Coproducer, row.coproducer_commission, "coproducer_commission")?;
    let tax = convert(LedgerEventType::Tax, row.taxes, "taxes")?;

    let advance = LedgerAdvance {
        order_id: order.id,
        gross_brl: Some(gross_brl),
        producer_net_brl: Some(net_brl),
        platform_fee_brl: platform_fee,
        affiliate_brl: affiliate,
        coproducer_brl: coproducer,
        tax_brl: tax,
    };
    let totals = ImportTotals {
        producer_net_brl: net_brl,
        platform_fee_brl: platform_fee.unwrap_or_default(),
        affiliate_brl: affiliate.unwrap_or_default(),
        coproducer_brl: coproducer.unwrap_or_default(),
        tax_brl: tax.unwrap_or_default(),
    };
    let write = AccountingWrite { transaction_id: order.transaction_id.clone(), events, advance };
    Ok(AccountingPlan { row_index, write, totals })
}
