use actix_web::{http::StatusCode, web, web::ServiceConfig};
use reconciliation_engine::{
    db_types::{Funnel, OfferMapping},
    CatalogIntegrityApi,
    ReconciliationDbError,
};
use serde_json::json;

use super::{
    helpers::get_request,
    mocks::MockCatalog,
};
use crate::routes::{health, FunnelOfferIntegrityRoute};

fn funnels() -> Vec<Funnel> {
    vec![
        Funnel { id: "f1".into(), project_id: Some("proj-1".into()), name: Some("Lançamento".into()) },
        Funnel { id: "f2".into(), project_id: Some("proj-1".into()), name: Some("Perpétuo".into()) },
    ]
}

fn offers() -> Vec<OfferMapping> {
    let offer = |id: i64, funnel: &str, name: &str| OfferMapping {
        id,
        project_id: Some("proj-1".into()),
        funnel_id: Some(funnel.into()),
        product_name: Some("Curso".into()),
        offer_name: Some(name.into()),
        origin: None,
    };
    vec![offer(1, "f1", "Oferta A"), offer(2, "f1", " oferta  a"), offer(3, "gone", "Auto-importado")]
}

fn configure_catalog(cfg: &mut ServiceConfig) {
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_funnels().returning(|project_id| {
        assert_eq!(project_id.map(|p| p.as_str()), Some("proj-1"));
        Ok(funnels())
    });
    catalog.expect_fetch_offer_mappings().returning(|_| Ok(offers()));
    cfg.service(FunnelOfferIntegrityRoute::<MockCatalog>::new()).app_data(web::Data::new(CatalogIntegrityApi::new(catalog)));
}

fn configure_broken_catalog(cfg: &mut ServiceConfig) {
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_funnels().returning(|_| Err(ReconciliationDbError::QueryError("no such table: funnels".into())));
    catalog.expect_fetch_offer_mappings().returning(|_| Ok(vec![]));
    cfg.service(FunnelOfferIntegrityRoute::<MockCatalog>::new()).app_data(web::Data::new(CatalogIntegrityApi::new(catalog)));
}

#[actix_web::test]
async fn funnel_offer_report() {
    let (status, body) = get_request("/diagnostics/funnel_offers?project_id=proj-1", configure_catalog).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let report = &body["report"];
    assert_eq!(report["totals"], json!({"funnels": 2, "offers": 3}));
    assert_eq!(report["integrity"]["offers_with_invalid_funnel_id"], 1);
    assert_eq!(report["integrity"]["funnels_without_offers"], 1);
    assert_eq!(report["duplicates"], json!({"groups": 1, "extra_rows": 1}));
    assert_eq!(report["semantics"]["generic_offer_names"], 1);
    assert_eq!(report["semantics"]["by_origem"], json!({"(vazio)": 3}));
    assert_eq!(report["samples"]["invalid_funnel_ids"], json!({"gone": 1}));
    assert_eq!(report["samples"]["funnels_without_offers"], json!([{"id": "f2", "name": "Perpétuo"}]));
}

#[actix_web::test]
async fn funnel_offer_report_backend_failure() {
    let (status, body) = get_request("/diagnostics/funnel_offers", configure_broken_catalog).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("no such table"), "{body}");
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = get_request("/health", |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("👍️\n"));
}
