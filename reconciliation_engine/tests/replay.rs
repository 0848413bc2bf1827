use chrono::{Duration, Utc};
use reconciliation_engine::{
    attribution::Attribution,
    currency::CurrencyNormalizer,
    db::sqlite::sales_core_events,
    db_types::{LedgerStatus, NewOrder, NewSalesCoreEvent, ProjectId, ProjectLookup, TransactionId},
    recon_api::options::{ProjectDirectory, ReconciliationOptions},
    test_utils::{
        fixtures::{
            purchase_notification,
            seed_order,
            seed_project,
            seed_raw_event,
            seed_sales_core_event,
            seed_webhook_sale,
        },
        prepare_env::{drop_database, prepare_test_env},
    },
    LedgerDatabase,
    RawEventReplayApi,
    ReconciliationError,
    SqliteDatabase,
};
use recon_common::Money;
use serde_json::json;
use tokio::runtime::Runtime;

const PROJECT: &str = "proj-1";
const SCK: &str = "fb|ret_1234567890|bf|feed|ad_0987654321";

fn replay_api(db: SqliteDatabase) -> RawEventReplayApi<SqliteDatabase> {
    let directory = ProjectDirectory::from_pairs([("legacy", PROJECT)]);
    RawEventReplayApi::new(db, CurrencyNormalizer::default(), directory, ReconciliationOptions::default())
}

async fn fetch_order(db: &SqliteDatabase, tx: &str) -> reconciliation_engine::db_types::Order {
    db.fetch_order_by_transaction_id(&ProjectId::from(PROJECT), &TransactionId::from(tx))
        .await
        .expect("Error fetching order")
        .expect("Order does not exist")
}

#[test]
fn replay_repairs_projections() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, db) = prepare_test_env().await;
        seed_project(&db, PROJECT, "acme").await;
        let order = seed_order(&db, NewOrder::new(PROJECT, "HP100")).await;
        seed_webhook_sale(&db, &order, Money::from(9_000)).await;
        seed_sales_core_event(&db, &NewSalesCoreEvent {
            project_id: ProjectId::from(PROJECT),
            provider_event_id: "hotmart:HP100:purchase".into(),
            transaction_id: TransactionId::from("HP100"),
            gross_brl: None,
            attribution: Attribution::default(),
            occurred_at: Utc::now(),
        })
        .await;
        let now = Utc::now();
        seed_raw_event(&db, "evt-old", PROJECT, &purchase_notification("HP101", 50.0, "BRL", SCK), now - Duration::days(30))
            .await;
        seed_raw_event(&db, "evt-1", PROJECT, &purchase_notification("HP100", 100.0, "BRL", SCK), now - Duration::hours(2))
            .await;
        seed_raw_event(&db, "evt-2", PROJECT, &json!({"event": "PURCHASE_APPROVED", "data": {}}), now - Duration::hours(1))
            .await;
        seed_raw_event(&db, "evt-3", PROJECT, &purchase_notification("HP999", 10.0, "BRL", SCK), now).await;

        let api = replay_api(db.clone());
        let result = api.replay(&ProjectLookup::Code("acme".into())).await.expect("Replay failed");
        assert_eq!(result.project_id, PROJECT);
        assert_eq!(result.events_processed, 2);
        assert_eq!(result.events_skipped, 1);
        assert_eq!(result.errors, 0);
        assert_eq!(result.sales_updated, 1);
        assert_eq!(result.core_events_updated, 1);
        assert_eq!(result.ledger_updated, 1);

        let order = fetch_order(&db, "HP100").await;
        assert_eq!(order.ledger_status, LedgerStatus::RealtimeComplete);
        assert_eq!(order.gross_brl, Some(Money::from(10_000)));
        assert_eq!(order.producer_net_brl, Some(Money::from(9_000)));
        assert_eq!(order.platform_fee_brl, Some(Money::from(1_000)));
        assert_eq!(order.attribution.meta_adset_id.as_deref(), Some("1234567890"));
        let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
        let sales = sales_core_events::fetch_for_transaction(&order.project_id, &order.transaction_id, &mut conn)
            .await
            .expect("Error fetching sale events");
        assert_eq!(sales[0].gross_brl, Some(Money::from(10_000)));
        assert_eq!(sales[0].attribution.meta_ad_id.as_deref(), Some("0987654321"));
        drop(conn);
        let ledger = db.fetch_ledger_events_for_order(order.id).await.expect("Error fetching ledger");
        assert_eq!(ledger[0].attribution.raw_sck.as_deref(), Some(SCK));
        assert_eq!(ledger[0].amount_brl, Money::from(9_000));

        // Replaying the same events again changes nothing
        let again = api.replay(&ProjectLookup::Id(ProjectId::from(PROJECT))).await.expect("Replay failed");
        assert_eq!(again.events_processed, 2);
        let order_again = fetch_order(&db, "HP100").await;
        assert_eq!(order_again.gross_brl, order.gross_brl);
        assert_eq!(order_again.attribution, order.attribution);
        drop_database(&url, db).await;
    });
}

#[test]
fn accounting_figures_survive_a_replay() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, db) = prepare_test_env().await;
        seed_project(&db, PROJECT, "acme").await;
        let order = NewOrder::new(PROJECT, "HP200")
            .with_gross(Money::from(12_345))
            .with_producer_net(Money::from(11_000))
            .with_status(LedgerStatus::AccountingComplete);
        seed_order(&db, order).await;
        seed_raw_event(&db, "evt-10", PROJECT, &purchase_notification("HP200", 100.0, "BRL", SCK), Utc::now()).await;

        let result = replay_api(db.clone()).replay(&ProjectLookup::Code("ACME".into())).await.expect("Replay failed");
        assert_eq!(result.sales_updated, 1);
        let order = fetch_order(&db, "HP200").await;
        assert_eq!(order.ledger_status, LedgerStatus::AccountingComplete);
        assert_eq!(order.gross_brl, Some(Money::from(12_345)));
        assert_eq!(order.producer_net_brl, Some(Money::from(11_000)));
        assert_eq!(order.attribution.raw_sck.as_deref(), Some(SCK));
        drop_database(&url, db).await;
    });
}

#[test]
fn project_resolution() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, db) = prepare_test_env().await;
        seed_project(&db, PROJECT, "acme").await;
        let api = replay_api(db.clone());
        let id = api.resolve_project(&ProjectLookup::Code("legacy".into())).await.expect("Directory lookup failed");
        assert_eq!(id.as_str(), PROJECT);
        let err = api.replay(&ProjectLookup::Code("nobody".into())).await.expect_err("Unknown project replayed");
        assert!(matches!(err, ReconciliationError::ProjectNotFound(_)));
        let err = api.replay(&ProjectLookup::Id(ProjectId::from("proj-x"))).await.expect_err("Unknown project replayed");
        assert!(matches!(err, ReconciliationError::ProjectNotFound(_)));
        drop_database(&url, db).await;
    });
}

#[test]
fn a_failing_event_does_not_stop_the_replay() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, db) = prepare_test_env().await;
        seed_project(&db, PROJECT, "acme").await;
        seed_order(&db, NewOrder::new(PROJECT, "HP300")).await;
        seed_order(&db, NewOrder::new(PROJECT, "HP301")).await;
        sqlx::query(
            "CREATE TRIGGER reject_hp300 BEFORE UPDATE ON orders WHEN NEW.transaction_id = 'HP300' BEGIN SELECT \
             RAISE(ABORT, 'rejected by test'); END;",
        )
        .execute(db.pool())
        .await
        .expect("Error creating trigger");
        let now = Utc::now();
        let first = purchase_notification("HP300", 100.0, "BRL", SCK);
        seed_raw_event(&db, "evt-20", PROJECT, &first, now - Duration::minutes(2)).await;
        let second = purchase_notification("HP301", 100.0, "BRL", SCK);
        seed_raw_event(&db, "evt-21", PROJECT, &second, now - Duration::minutes(1)).await;

        let result = replay_api(db.clone()).replay(&ProjectLookup::Code("acme".into())).await.expect("Replay failed");
        assert_eq!(result.errors, 1);
        assert_eq!(result.events_processed, 1);
        assert_eq!(result.sales_updated, 1);
        assert_eq!(fetch_order(&db, "HP300").await.gross_brl, None);
        assert_eq!(fetch_order(&db, "HP301").await.gross_brl, Some(Money::from(10_000)));
        drop_database(&url, db).await;
    });
}
