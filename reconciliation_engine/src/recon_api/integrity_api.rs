use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::CatalogManagement,
    db_types::ProjectId,
    integrity::CatalogReport,
    recon_api::errors::ReconciliationError,
};

/// Read-only diagnostics over the funnel and offer catalog.
pub struct CatalogIntegrityApi<B> {
    db: B,
}

impl<B> Debug for CatalogIntegrityApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogIntegrityApi")
    }
}

impl<B> CatalogIntegrityApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CatalogIntegrityApi<B>
where B: CatalogManagement
{
    pub async fn report(&self, project_id: Option<&ProjectId>) -> Result<CatalogReport, ReconciliationError> {
        let funnels = self.db.fetch_funnels(project_id).await?;
        let offers = self.db.fetch_offer_mappings(project_id).await?;
        let report = CatalogReport::build(&funnels, &offers);
        debug!(
            "🗃️ Catalog report: {} funnels, {} offers, {} duplicate groups, {} offers with unknown funnels",
            report.totals.funnels,
            report.totals.offers,
            report.duplicates.groups,
            report.integrity.offers_with_invalid_funnel_id
        );
        Ok(report)
    }
}
