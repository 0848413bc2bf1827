//! Integrity checks over the offer catalog.
//!
//! The catalog maps the products and offers sold on the platform onto the project's sales funnels. It is maintained
//! by hand and by bulk imports, so it drifts: offers point at funnels that were deleted, the same offer gets imported
//! twice with different spacing, or an import leaves a placeholder name behind. [`CatalogReport::build`] loads nothing
//! itself; it summarises the rows it is given.
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::db_types::{Funnel, OfferMapping};

/// Offer names that bulk imports leave behind when the real name is unknown.
pub const GENERIC_OFFER_NAMES: [&str; 3] =
    ["auto-importado", "auto-importado de vendas existentes", "importado das vendas"];
/// Histogram bucket for offers with no `origem`.
pub const EMPTY_ORIGIN: &str = "(vazio)";
pub const MAX_SAMPLES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogTotals {
    pub funnels: usize,
    pub offers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityCounts {
    pub offers_missing_funnel_id: usize,
    pub offers_with_invalid_funnel_id: usize,
    pub offers_missing_project_id: usize,
    pub offers_missing_nome_produto: usize,
    pub offers_missing_nome_oferta: usize,
    pub funnels_without_offers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateCounts {
    pub groups: usize,
    /// Rows beyond the first in every duplicate group
    pub extra_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SemanticCounts {
    pub generic_offer_names: usize,
    pub by_origem: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelSample {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub count: usize,
    pub project_id: String,
    pub funnel_id: String,
    pub nome_produto: String,
    pub nome_oferta: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSamples {
    pub invalid_funnel_ids: BTreeMap<String, usize>,
    pub funnels_without_offers: Vec<FunnelSample>,
    pub top_duplicate_groups: Vec<DuplicateGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
    pub totals: CatalogTotals,
    pub integrity: IntegrityCounts,
    pub duplicates: DuplicateCounts,
    pub semantics: SemanticCounts,
    pub samples: CatalogSamples,
}

type DuplicateKey = (String, String, String, String);

/// Trims, lower-cases and collapses internal whitespace. Missing values normalise to the empty string.
pub fn normalize_key(value: Option<&str>) -> String {
    value.unwrap_or_default().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::is_empty).unwrap_or(true)
}

impl CatalogReport {
    pub fn build(funnels: &[Funnel], offers: &[OfferMapping]) -> Self {
        let funnel_ids = funnels.iter().map(|f| f.id.as_str()).collect::<HashSet<_>>();
        let mut report = CatalogReport {
            totals: CatalogTotals { funnels: funnels.len(), offers: offers.len() },
            ..Default::default()
        };

        let mut referenced = HashSet::new();
        let mut group_index: HashMap<DuplicateKey, usize> = HashMap::new();
        let mut groups: Vec<Vec<&OfferMapping>> = Vec::new();
        for offer in offers {
            let integrity = &mut report.integrity;
            match offer.funnel_id.as_deref().filter(|f| !f.is_empty()) {
                None => integrity.offers_missing_funnel_id += 1,
                Some(funnel_id) => {
                    referenced.insert(funnel_id);
                    if !funnel_ids.contains(funnel_id) {
                        integrity.offers_with_invalid_funnel_id += 1;
                        *report.samples.invalid_funnel_ids.entry(funnel_id.to_string()).or_default() += 1;
                    }
                },
            }
            integrity.offers_missing_project_id += usize::from(is_blank(&offer.project_id));
            integrity.offers_missing_nome_produto += usize::from(is_blank(&offer.product_name));
            integrity.offers_missing_nome_oferta += usize::from(is_blank(&offer.offer_name));

            let offer_name = normalize_key(offer.offer_name.as_deref());
            if GENERIC_OFFER_NAMES.contains(&offer_name.as_str()) {
                report.semantics.generic_offer_names += 1;
            }
            let origin = offer.origin.as_deref().filter(|o| !o.is_empty()).unwrap_or(EMPTY_ORIGIN);
            *report.semantics.by_origem.entry(origin.to_string()).or_default() += 1;

            let key = (
                normalize_key(offer.project_id.as_deref()),
                normalize_key(offer.funnel_id.as_deref()),
                normalize_key(offer.product_name.as_deref()),
                offer_name,
            );
            let index = *group_index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[index].push(offer);
        }

        let orphans = funnels.iter().filter(|f| !referenced.contains(f.id.as_str())).collect::<Vec<_>>();
        report.integrity.funnels_without_offers = orphans.len();
        report.samples.funnels_without_offers = orphans
            .iter()
            .take(MAX_SAMPLES)
            .map(|f| FunnelSample { id: f.id.clone(), name: f.name.clone().unwrap_or_default() })
            .collect();

        let mut duplicates = groups.into_iter().filter(|g| g.len() > 1).collect::<Vec<_>>();
        report.duplicates.groups = duplicates.len();
        report.duplicates.extra_rows = duplicates.iter().map(|g| g.len() - 1).sum();
        // stable sort keeps first-seen order among equally large groups
        duplicates.sort_by(|a, b| b.len().cmp(&a.len()));
        report.samples.top_duplicate_groups = duplicates
            .iter()
            .take(MAX_SAMPLES)
            .map(|rows| {
                let first = rows[0];
                DuplicateGroup {
                    count: rows.len(),
                    project_id: first.project_id.clone().unwrap_or_default(),
                    funnel_id: first.funnel_id.clone().unwrap_or_default(),
                    nome_produto: first.product_name.clone().unwrap_or_default(),
                    nome_oferta: first.offer_name.clone().unwrap_or_default(),
                }
            })
            .collect();
        report
    }
}
