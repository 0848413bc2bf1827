//! Per-actor split of a sale, as reported in the `commissions` list of a provider notification.
//!
//! `None` means the provider did not report an amount for that actor. `Some(0)` means it reported zero. The two are
//! never conflated.
use log::trace;
use recon_common::Money;
use serde::Serialize;
use serde_json::Value;

use crate::{
    currency::CurrencyNormalizer,
    helpers::{
        payload::{array_at, data_section, str_at},
        value_as_decimal,
    },
};

/// One entry of the commissions list.
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionEntry {
    pub source: String,
    pub value: f64,
    pub currency: Option<String>,
}

impl CommissionEntry {
    pub fn new<S: Into<String>>(source: S, value: f64) -> Self {
        Self { source: source.into(), value, currency: None }
    }

    /// Reads an entry from JSON. Entries without a role tag or a numeric value are ignored.
    pub fn from_json(value: &Value) -> Option<Self> {
        let source = str_at(value, &["source"])?.to_string();
        let amount = value.get("value").and_then(value_as_decimal)?;
        let currency = str_at(value, &["currency_value"]).map(str::to_string);
        Some(Self { source, value: amount, currency })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialBreakdown {
    pub platform_fee: Option<Money>,
    pub producer_net: Option<Money>,
    pub affiliate: Option<Money>,
    pub coproducer: Option<Money>,
    /// The currency the commissions were reported in, if the provider said so
    pub currency: Option<String>,
}

impl FinancialBreakdown {
    /// Assigns each entry to its canonical role. Role tags are matched case-insensitively and unknown roles are
    /// ignored. When a role appears more than once, the last entry wins.
    pub fn from_entries(entries: &[CommissionEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, entry| {
            let amount = match Money::try_from(entry.value) {
                Ok(m) => m,
                Err(e) => {
                    trace!("Ignoring commission entry for {}. {e}", entry.source);
                    return acc;
                },
            };
            let slot = match entry.source.to_ascii_lowercase().as_str() {
                "marketplace" => &mut acc.platform_fee,
                "producer" => &mut acc.producer_net,
                "affiliate" => &mut acc.affiliate,
                "co_producer" => &mut acc.coproducer,
                _ => return acc,
            };
            *slot = Some(amount);
            if entry.currency.is_some() {
                acc.currency = entry.currency.clone();
            }
            acc
        })
    }

    /// Extracts the breakdown from the `commissions` list of a provider payload.
    pub fn from_payload(doc: &Value) -> Self {
        let entries = array_at(data_section(doc), &["commissions"])
            .map(|list| list.iter().filter_map(CommissionEntry::from_json).collect::<Vec<_>>())
            .unwrap_or_default();
        Self::from_entries(&entries)
    }

    pub fn is_empty(&self) -> bool {
        self.platform_fee.is_none() &&
            self.producer_net.is_none() &&
            self.affiliate.is_none() &&
            self.coproducer.is_none()
    }

    /// Converts every reported amount into the settlement currency. `fallback_currency` is used when the commissions
    /// did not state their own currency.
    pub fn normalized(&self, fallback_currency: &str, normalizer: &CurrencyNormalizer) -> FinancialBreakdown {
        let currency = self.currency.as_deref().unwrap_or(fallback_currency);
        let convert = |m: Option<Money>| m.map(|m| normalizer.normalize(m, currency).settlement_amount);
        FinancialBreakdown {
            platform_fee: convert(self.platform_fee),
            producer_net: convert(self.producer_net),
            affiliate: convert(self.affiliate),
            coproducer: convert(self.coproducer),
            currency: Some(normalizer.settlement_currency().to_string()),
        }
    }
}
