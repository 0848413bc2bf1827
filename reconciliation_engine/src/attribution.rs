//! # Campaign attribution
//!
//! The checkout flow stamps each purchase with an opaque, pipe-delimited tracking string (the "SCK"):
//!
//! ```text
//! source | medium | campaign | term | content
//! ```
//!
//! Ad managers usually append the platform's numeric id to the adset, campaign and ad names, so
//! `"Retargeting_120208871234560001"` is both a human label and a pointer to adset `120208871234560001`.
//!
//! Parsing is purely positional. Segments are stored exactly as they appear and are never mapped onto a vocabulary of
//! "known" sources or mediums.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::helpers::payload::{purchase_section, str_at};

/// Fields that may hold the tracking string, in decreasing order of preference. Paths are relative to the purchase
/// section of the payload.
const SCK_PATHS: [&[&str]; 4] =
    [&["origin", "sck"], &["checkout_origin"], &["tracking", "source_sck"], &["tracking", "source"]];

static TRAILING_PLATFORM_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{10,})$").expect("valid regex literal"));

/// Structured campaign attribution. Every field is `None` when the information is not available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, FromRow, Serialize, Deserialize)]
pub struct Attribution {
    /// The complete tracking string, verbatim
    pub raw_sck: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub meta_campaign_id: Option<String>,
    pub meta_adset_id: Option<String>,
    pub meta_ad_id: Option<String>,
}

impl Attribution {
    /// Decodes a tracking string. Absent or empty input yields an attribution where every field is `None`.
    pub fn parse(sck: Option<&str>) -> Self {
        let raw = match sck {
            Some(s) if !s.is_empty() => s,
            _ => return Self::default(),
        };
        let mut segments = raw.split('|').map(|s| (!s.is_empty()).then(|| s.to_string()));
        let mut next = || segments.next().flatten();
        let utm_source = next();
        let utm_medium = next();
        let utm_campaign = next();
        let utm_term = next();
        let utm_content = next();
        Self {
            raw_sck: Some(raw.to_string()),
            meta_adset_id: utm_medium.as_deref().and_then(trailing_platform_id),
            meta_campaign_id: utm_campaign.as_deref().and_then(trailing_platform_id),
            meta_ad_id: utm_content.as_deref().and_then(trailing_platform_id),
            utm_source,
            utm_medium,
            utm_campaign,
            utm_term,
            utm_content,
        }
    }

    /// Resolves the tracking string in a provider payload and decodes it.
    pub fn from_payload(doc: &Value) -> Self {
        Self::parse(resolve_tracking_string(doc))
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Finds the field of a provider payload that holds the tracking string. The first non-empty candidate wins.
pub fn resolve_tracking_string(doc: &Value) -> Option<&str> {
    let purchase = purchase_section(doc);
    SCK_PATHS.iter().find_map(|path| str_at(purchase, path))
}

/// Extracts a platform id (a run of at least 10 digits) from the end of a segment.
pub fn trailing_platform_id(segment: &str) -> Option<String> {
    TRAILING_PLATFORM_ID.captures(segment).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}
