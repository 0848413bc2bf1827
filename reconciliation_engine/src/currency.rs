//! Best-effort conversion of foreign-currency amounts into the settlement currency.
//!
//! Rates come from a static table of approximate values. This is deliberately lossy: every ledger record keeps the
//! original amount and currency next to the converted one so the approximation can always be audited.
use std::collections::HashMap;

use log::warn;
use recon_common::{Money, DEFAULT_SETTLEMENT_CURRENCY};
use serde::Serialize;

/// Approximate units of settlement currency (BRL) per unit of foreign currency.
const DEFAULT_BRL_RATES: [(&str, f64); 16] = [
    ("USD", 5.0),
    ("EUR", 5.45),
    ("GBP", 6.35),
    ("CAD", 3.65),
    ("AUD", 3.3),
    ("CHF", 5.7),
    ("JPY", 0.034),
    ("MXN", 0.28),
    ("ARS", 0.0055),
    ("CLP", 0.0054),
    ("COP", 0.0013),
    ("PEN", 1.35),
    ("UYU", 0.125),
    ("PYG", 0.00068),
    ("BOB", 0.72),
    ("PTE", 5.45),
];

/// An immutable currency → rate lookup table. Codes are stored upper-case.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateTable {
    rates: HashMap<String, f64>,
}

impl Default for ExchangeRateTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_BRL_RATES)
    }
}

impl ExchangeRateTable {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let rates = pairs
            .into_iter()
            .filter(|(code, rate)| {
                let valid = rate.is_finite() && *rate > 0.0;
                if !valid {
                    warn!("Ignoring invalid exchange rate {rate} for {}", code.as_ref());
                }
                valid
            })
            .map(|(code, rate)| (code.as_ref().trim().to_ascii_uppercase(), rate))
            .collect();
        Self { rates }
    }

    /// Returns a copy of this table with `overrides` replacing or extending its entries.
    pub fn with_overrides(&self, overrides: &ExchangeRateTable) -> Self {
        let mut rates = self.rates.clone();
        rates.extend(overrides.rates.iter().map(|(k, v)| (k.clone(), *v)));
        Self { rates }
    }

    pub fn rate_for(&self, currency: &str) -> Option<f64> {
        self.rates.get(&currency.trim().to_ascii_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// The outcome of a conversion. The original amount and currency are always retained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedAmount {
    pub settlement_amount: Money,
    pub original_amount: Money,
    pub original_currency: String,
    pub rate: f64,
    /// True when the currency was not in the table and a rate of 1 was assumed
    pub used_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct CurrencyNormalizer {
    settlement_currency: String,
    rates: ExchangeRateTable,
}

impl Default for CurrencyNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLEMENT_CURRENCY, ExchangeRateTable::default())
    }
}

impl CurrencyNormalizer {
    pub fn new(settlement_currency: &str, rates: ExchangeRateTable) -> Self {
        Self { settlement_currency: settlement_currency.trim().to_ascii_uppercase(), rates }
    }

    pub fn settlement_currency(&self) -> &str {
        &self.settlement_currency
    }

    pub fn is_settlement_currency(&self, currency: &str) -> bool {
        currency.trim().eq_ignore_ascii_case(&self.settlement_currency)
    }

    /// Converts `amount` using the rate table. Unknown currencies are passed through with a rate of 1.
    pub fn normalize(&self, amount: Money, currency: &str) -> NormalizedAmount {
        self.normalize_with_rate(amount, currency, None)
    }

    /// Converts `amount`, preferring an explicitly supplied rate (e.g. the one printed on an accounting row) over the
    /// table.
    pub fn normalize_with_rate(&self, amount: Money, currency: &str, explicit_rate: Option<f64>) -> NormalizedAmount {
        let original_currency = currency.trim().to_ascii_uppercase();
        let (rate, used_fallback) = if self.is_settlement_currency(&original_currency) {
            (1.0, false)
        } else if let Some(rate) = explicit_rate.filter(|r| r.is_finite() && *r > 0.0) {
            (rate, false)
        } else {
            match self.rates.rate_for(&original_currency) {
                Some(rate) => (rate, false),
                None => {
                    warn!(
                        "No exchange rate for {original_currency}. Assuming parity with {}; the converted amount is \
                         approximate.",
                        self.settlement_currency
                    );
                    (1.0, true)
                },
            }
        };
        NormalizedAmount {
            settlement_amount: amount.scale(rate),
            original_amount: amount,
            original_currency,
            rate,
            used_fallback,
        }
    }
}
