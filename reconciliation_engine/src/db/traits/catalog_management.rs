use crate::{
    db::traits::ReconciliationDbError,
    db_types::{Funnel, OfferMapping, ProjectId},
};

/// Read access to the funnel/offer catalog.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_funnels(&self, project_id: Option<&ProjectId>) -> Result<Vec<Funnel>, ReconciliationDbError>;

    async fn fetch_offer_mappings(
        &self,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<OfferMapping>, ReconciliationDbError>;
}
