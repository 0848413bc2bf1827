use chrono::Utc;
use reconciliation_engine::{
    db::sqlite::{order_items, raw_events},
    db_types::{ItemType, NewOrder, ProjectId, RawEvent},
    recon_api::{item_recovery_api::ItemRecoveryRequest, options::ReconciliationOptions},
    test_utils::{
        fixtures::{seed_order, seed_order_item, seed_project, seed_raw_event},
        prepare_env::{drop_database, prepare_test_env},
    },
    ItemRecoveryApi,
    ReconciliationError,
    SqliteDatabase,
};
use serde_json::json;
use tokio::runtime::Runtime;

const PROJECT: &str = "proj-1";

/// Seeds five items: two misclassified, one correct, one without a payload and one with a corrupt payload.
/// Returns the ids of the two misclassified items.
async fn seed_items(db: &SqliteDatabase) -> (i64, i64) {
    seed_project(db, PROJECT, "acme").await;
    let order = seed_order(db, NewOrder::new(PROJECT, "HP300")).await;
    let upsell = json!({"data": {"purchase": {"transaction": "HP301", "offer": {"name": "Upsell Mentoria"}}}});
    let bump = json!({"data": {"purchase": {
        "transaction": "HP302",
        "offer": {"name": "Checklist"},
        "order_bump": {"is_order_bump": true, "parent_purchase_transaction": "HP300"}
    }}});
    let main = json!({"data": {"purchase": {"transaction": "HP300", "offer": {"name": "Curso"}}}});
    seed_raw_event(db, "evt-upsell", PROJECT, &upsell, Utc::now()).await;
    seed_raw_event(db, "evt-bump", PROJECT, &bump, Utc::now()).await;
    seed_raw_event(db, "evt-main", PROJECT, &main, Utc::now()).await;
    let corrupt = RawEvent {
        id: "evt-corrupt".into(),
        project_id: ProjectId::from(PROJECT),
        provider: "hotmart".into(),
        payload: "{not json".into(),
        received_at: Utc::now(),
    };
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    raw_events::insert_raw_event(&corrupt, &mut conn).await.expect("Error inserting raw event");
    drop(conn);

    let upsell_item = seed_order_item(db, order.id, Some("evt-upsell"), ItemType::Main).await;
    seed_order_item(db, order.id, Some("evt-bump"), ItemType::Bump).await;
    seed_order_item(db, order.id, None, ItemType::Main).await;
    let main_item = seed_order_item(db, order.id, Some("evt-main"), ItemType::Downsell).await;
    seed_order_item(db, order.id, Some("evt-corrupt"), ItemType::Main).await;
    (upsell_item.id, main_item.id)
}

async fn item_type(db: &SqliteDatabase, id: i64) -> ItemType {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let item = order_items::fetch_order_item(id, &mut conn).await.expect("Error fetching item");
    item.expect("Item does not exist").item_type
}

#[test]
fn dry_run_reports_without_writing() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, db) = prepare_test_env().await;
        let (upsell_id, main_id) = seed_items(&db).await;
        let api = ItemRecoveryApi::new(db.clone(), ReconciliationOptions::default());
        let req = ItemRecoveryRequest { project_id: Some(PROJECT.into()), dry_run: Some(true), batch_size: Some(2) };
        let result = api.recover(req).await.expect("Recovery failed");
        assert!(result.dry_run);
        assert_eq!(result.stats.evaluated, 5);
        assert_eq!(result.stats.to_recover, 2);
        assert_eq!(result.stats.recovered, 0);
        assert_eq!(result.stats.skipped, 1);
        assert_eq!(result.stats.errors, 1);
        assert_eq!(result.updates.len(), 2);
        assert_eq!(result.updates[0].id, upsell_id);
        assert_eq!(result.updates[0].to, ItemType::Upsell);
        assert_eq!(result.updates[1].from, ItemType::Downsell);
        assert_eq!(item_type(&db, upsell_id).await, ItemType::Main);
        assert_eq!(item_type(&db, main_id).await, ItemType::Downsell);
        drop_database(&url, db).await;
    });
}

#[test]
fn recovery_is_idempotent() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, db) = prepare_test_env().await;
        let (upsell_id, main_id) = seed_items(&db).await;
        let api = ItemRecoveryApi::new(db.clone(), ReconciliationOptions::default().with_recovery_batch_size(3));
        let result = api.recover(ItemRecoveryRequest::default()).await.expect("Recovery failed");
        assert_eq!(result.stats.evaluated, 5);
        assert_eq!(result.stats.recovered, 2);
        assert_eq!(item_type(&db, upsell_id).await, ItemType::Upsell);
        assert_eq!(item_type(&db, main_id).await, ItemType::Main);

        let again = api.recover(ItemRecoveryRequest::default()).await.expect("Recovery failed");
        assert_eq!(again.stats.to_recover, 0);
        assert_eq!(again.stats.recovered, 0);
        assert!(again.updates.is_empty());

        let other = ItemRecoveryRequest { project_id: Some("proj-2".into()), ..Default::default() };
        assert_eq!(api.recover(other).await.expect("Recovery failed").stats.evaluated, 0);
        drop_database(&url, db).await;
    });
}

#[test]
fn zero_batch_size_is_rejected() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, db) = prepare_test_env().await;
        let api = ItemRecoveryApi::new(db.clone(), ReconciliationOptions::default());
        let req = ItemRecoveryRequest { batch_size: Some(0), ..Default::default() };
        let err = api.recover(req).await.expect_err("Zero batch size accepted");
        assert!(matches!(err, ReconciliationError::InvalidRequest(_)));
        drop_database(&url, db).await;
    });
}
