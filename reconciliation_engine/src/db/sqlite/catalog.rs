use sqlx::SqliteConnection;

use crate::{
    db::traits::ReconciliationDbError,
    db_types::{Funnel, OfferMapping, ProjectId},
};

pub async fn insert_funnel(funnel: &Funnel, conn: &mut SqliteConnection) -> Result<(), ReconciliationDbError> {
    sqlx::query("INSERT INTO funnels (id, project_id, name) VALUES ($1, $2, $3)")
        .bind(funnel.id.as_str())
        .bind(funnel.project_id.as_deref())
        .bind(funnel.name.as_deref())
        .execute(conn)
        .await?;
    Ok(())
}

/// Inserts an offer mapping. The `id` of `offer` is ignored and the generated id is returned.
pub async fn insert_offer_mapping(
    offer: &OfferMapping,
    conn: &mut SqliteConnection,
) -> Result<i64, ReconciliationDbError> {
    let id = sqlx::query_scalar(
        "INSERT INTO offer_mappings (project_id, funnel_id, nome_produto, nome_oferta, origem) VALUES ($1, $2, $3, \
         $4, $5) RETURNING id",
    )
    .bind(offer.project_id.as_deref())
    .bind(offer.funnel_id.as_deref())
    .bind(offer.product_name.as_deref())
    .bind(offer.offer_name.as_deref())
    .bind(offer.origin.as_deref())
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_funnels(
    project_id: Option<&ProjectId>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Funnel>, ReconciliationDbError> {
    let funnels =
        sqlx::query_as("SELECT id, project_id, name FROM funnels WHERE $1 IS NULL OR project_id = $1 ORDER BY id")
            .bind(project_id.map(ProjectId::as_str))
            .fetch_all(conn)
            .await?;
    Ok(funnels)
}

pub async fn fetch_offer_mappings(
    project_id: Option<&ProjectId>,
    conn: &mut SqliteConnection,
) -> Result<Vec<OfferMapping>, ReconciliationDbError> {
    let offers = sqlx::query_as(
        "SELECT id, project_id, funnel_id, nome_produto, nome_oferta, origem FROM offer_mappings WHERE $1 IS NULL OR \
         project_id = $1 ORDER BY id",
    )
    .bind(project_id.map(ProjectId::as_str))
    .fetch_all(conn)
    .await?;
    Ok(offers)
}
