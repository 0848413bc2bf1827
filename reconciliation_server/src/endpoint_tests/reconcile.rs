use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use recon_common::Money;
use reconciliation_engine::{
    attribution::Attribution,
    currency::CurrencyNormalizer,
    db_types::{ClassifiableItem, ItemType, LedgerStatus, Order, Project, ProjectId, ProjectLookup, SourceOrigin},
    recon_api::options::{ProjectDirectory, ReconciliationOptions},
    AccountingImportApi,
    AccountingWriteResult,
    ItemRecoveryApi,
    RawEventReplayApi,
    ReconciliationDbError,
};
use serde_json::json;

use super::{
    helpers::post_request,
    mocks::{MockItemStore, MockLedger, MockRawEventLog},
};
use crate::routes::{CsvImportRoute, RecoverItemTypesRoute, ReplayRawEventsRoute};

//----------------------------------------------   CSV import  ----------------------------------------------------

fn pending_order(id: i64, tx: &str) -> Order {
    Order {
        id,
        project_id: ProjectId::from("proj-1"),
        transaction_id: tx.into(),
        provider: "hotmart".into(),
        gross_brl: None,
        producer_net_brl: None,
        platform_fee_brl: None,
        affiliate_brl: None,
        coproducer_brl: None,
        tax_brl: None,
        ledger_status: LedgerStatus::Pending,
        attribution: Attribution::default(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn configure_import(cfg: &mut ServiceConfig) {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_order_by_transaction_id().returning(|_, tx| match tx.as_str() {
        "HP001" => Ok(Some(pending_order(1, "HP001"))),
        _ => Ok(None),
    });
    ledger.expect_has_ledger_events_from().returning(|_, origin| {
        assert_eq!(origin, SourceOrigin::Csv);
        Ok(false)
    });
    ledger.expect_insert_accounting_writes().times(1).returning(|writes| {
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].advance.order_id, 1);
        assert_eq!(writes[0].advance.producer_net_brl, Some(Money::from(8_500)));
        Ok(AccountingWriteResult { events_inserted: writes[0].events.len() as u64, orders_completed: 1 })
    });
    let api = AccountingImportApi::new(ledger, CurrencyNormalizer::default(), ReconciliationOptions::default());
    cfg.service(CsvImportRoute::<MockLedger>::new()).app_data(web::Data::new(api));
}

fn configure_untouched_import(cfg: &mut ServiceConfig) {
    // No expectations: any storage call fails the test
    let api = AccountingImportApi::new(MockLedger::new(), CurrencyNormalizer::default(), ReconciliationOptions::default());
    cfg.service(CsvImportRoute::<MockLedger>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn csv_import() {
    let body = json!({
        "project_id": "proj-1",
        "reference_period": "2024-03",
        "rows": [
            {"transaction_id": "HP001", "gross_value": 100.0, "net_value": 85.0, "net_value_brl": 85.0, "platform_fee": 15.0},
            {"transaction_id": "HP404", "gross_value": 50.0, "net_value": 40.0, "net_value_brl": 40.0}
        ]
    });
    let (status, body) = post_request("/reconcile/csv_import", &body.to_string(), configure_import).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let result = &body["result"];
    assert_eq!(result["orders_processed"], 1);
    assert_eq!(result["ledger_events_created"], 2);
    assert_eq!(result["orders_updated_to_accounting_complete"], 1);
    assert_eq!(result["errors"], json!([]));
    assert_eq!(result["totals"]["producer_net_brl"], 85.0);
    assert_eq!(result["totals"]["platform_fee_brl"], 15.0);
}

#[actix_web::test]
async fn csv_import_missing_fields() {
    let body = json!({"project_id": "proj-1", "rows": [{"transaction_id": "HP001"}]});
    let (status, body) = post_request("/reconcile/csv_import", &body.to_string(), configure_untouched_import).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Invalid request. reference_period is required"}));

    let body = json!({"project_id": "proj-1", "reference_period": "2024-03", "rows": []});
    let (status, body) = post_request("/reconcile/csv_import", &body.to_string(), configure_untouched_import).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn csv_import_malformed_body() {
    let (status, body) = post_request("/reconcile/csv_import", "{\"rows\": ", configure_untouched_import).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

//----------------------------------------------   Replay  ----------------------------------------------------

fn configure_replay(cfg: &mut ServiceConfig) {
    let mut log = MockRawEventLog::new();
    log.expect_fetch_project().returning(|lookup| match lookup {
        ProjectLookup::Code(code) if code == "acme" => {
            Ok(Some(Project { id: ProjectId::from("proj-1"), code: Some("acme".into()), name: None }))
        },
        _ => Ok(None),
    });
    log.expect_fetch_raw_events_since().returning(|project_id, _| {
        assert_eq!(project_id.as_str(), "proj-1");
        Ok(vec![])
    });
    let api = RawEventReplayApi::new(
        log,
        CurrencyNormalizer::default(),
        ProjectDirectory::default(),
        ReconciliationOptions::default(),
    );
    cfg.service(ReplayRawEventsRoute::<MockRawEventLog>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn replay_by_query_code() {
    let (status, body) = post_request("/reconcile/replay_raw_events?project_code=acme", "", configure_replay).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "projectId": "proj-1",
            "eventsProcessed": 0,
            "salesUpdated": 0,
            "coreEventsUpdated": 0,
            "ledgerUpdated": 0,
            "errors": 0,
            "eventsSkipped": 0
        })
    );
}

#[actix_web::test]
async fn replay_by_body_code() {
    let (status, body) = post_request("/reconcile/replay_raw_events", r#"{"project_code": "acme"}"#, configure_replay).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projectId"], "proj-1");
}

#[actix_web::test]
async fn replay_unknown_project() {
    let (status, body) = post_request("/reconcile/replay_raw_events?project_code=nobody", "", configure_replay).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Project not found. code 'nobody'"}));
}

#[actix_web::test]
async fn replay_without_project() {
    let (status, body) = post_request("/reconcile/replay_raw_events", "", configure_replay).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

//----------------------------------------------   Item recovery  ----------------------------------------------------

fn configure_recovery(cfg: &mut ServiceConfig) {
    let mut store = MockItemStore::new();
    store.expect_fetch_classifiable_items().returning(|_, after_id, _| {
        if after_id > 0 {
            return Ok(vec![]);
        }
        Ok(vec![
            ClassifiableItem {
                id: 7,
                item_type: ItemType::Main,
                payload: Some(json!({"data": {"purchase": {"offer": {"name": "Upsell VIP"}}}}).to_string()),
            },
            ClassifiableItem { id: 8, item_type: ItemType::Main, payload: None },
        ])
    });
    store.expect_update_item_type().returning(|id, item_type| {
        assert_eq!((id, item_type), (7, ItemType::Upsell));
        Ok(true)
    });
    let api = ItemRecoveryApi::new(store, ReconciliationOptions::default().with_recovery_batch_size(2));
    cfg.service(RecoverItemTypesRoute::<MockItemStore>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn recover_item_types() {
    let (status, body) = post_request("/reconcile/recover_item_types", "", configure_recovery).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "dry_run": false,
            "stats": {"evaluated": 2, "to_recover": 1, "recovered": 1, "skipped": 1, "errors": 0},
            "updates": [{"id": 7, "from": "main", "to": "upsell"}]
        })
    );
}

fn configure_recovery_with_failing_second_page(cfg: &mut ServiceConfig) {
    let mut store = MockItemStore::new();
    store.expect_fetch_classifiable_items().returning(|_, after_id, _| {
        if after_id > 0 {
            return Err(ReconciliationDbError::QueryError("page 2 failed".into()));
        }
        Ok(vec![ClassifiableItem {
            id: 7,
            item_type: ItemType::Main,
            payload: Some(json!({"data": {"purchase": {"offer": {"name": "Upsell VIP"}}}}).to_string()),
        }])
    });
    store.expect_update_item_type().times(1).returning(|_, _| Ok(true));
    let api = ItemRecoveryApi::new(store, ReconciliationOptions::default());
    cfg.service(RecoverItemTypesRoute::<MockItemStore>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn recover_item_types_keeps_progress_when_a_later_page_fails() {
    let (status, body) = post_request(
        "/reconcile/recover_item_types",
        r#"{"batch_size": 1}"#,
        configure_recovery_with_failing_second_page,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["stats"], json!({"evaluated": 1, "to_recover": 1, "recovered": 1, "skipped": 0, "errors": 1}));
    assert_eq!(body["updates"], json!([{"id": 7, "from": "main", "to": "upsell"}]));
}

fn configure_recovery_with_failing_first_page(cfg: &mut ServiceConfig) {
    let mut store = MockItemStore::new();
    store
        .expect_fetch_classifiable_items()
        .returning(|_, _, _| Err(ReconciliationDbError::QueryError("database is locked".into())));
    store.expect_update_item_type().never();
    let api = ItemRecoveryApi::new(store, ReconciliationOptions::default());
    cfg.service(RecoverItemTypesRoute::<MockItemStore>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn recover_item_types_first_page_failure_is_fatal() {
    let (status, body) =
        post_request("/reconcile/recover_item_types", "", configure_recovery_with_failing_first_page).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("database is locked"));
}

#[actix_web::test]
async fn recover_item_types_rejects_zero_batch() {
    let (status, body) = post_request("/reconcile/recover_item_types", r#"{"batch_size": 0}"#, configure_recovery).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
