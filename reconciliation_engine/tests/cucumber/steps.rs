use std::str::FromStr;

use cucumber::{gherkin::Step, given, then, when};
use reconciliation_engine::{
    db_types::{LedgerStatus, NewOrder, Order, ProjectId, SourceOrigin, TransactionId},
    recon_api::import_objects::CsvImportRequest,
    test_utils::fixtures::{seed_order, seed_webhook_sale},
    LedgerDatabase,
};
use recon_common::Money;
use serde_json::{json, Map, Value};

use crate::cucumber::LedgerWorld;

fn money(value: f64) -> Money {
    Money::try_from(value).expect("Not a valid amount")
}

async fn fetch_order(world: &LedgerWorld, tx: &str) -> Order {
    let project_id = ProjectId::from(world.project_id.as_str());
    world
        .db()
        .fetch_order_by_transaction_id(&project_id, &TransactionId::from(tx))
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {tx} does not exist"))
}

#[given(expr = "an order {word} with status {word}")]
async fn an_order(world: &mut LedgerWorld, tx: String, status: String) {
    let status = LedgerStatus::from_str(&status).expect("Not a ledger status");
    let order = NewOrder::new(world.project_id.as_str(), tx).with_status(status);
    seed_order(world.db(), order).await;
}

#[given(expr = "order {word} has a realtime sale of {float} BRL")]
async fn a_realtime_sale(world: &mut LedgerWorld, tx: String, amount: f64) {
    let order = fetch_order(world, &tx).await;
    seed_webhook_sale(world.db(), &order, money(amount)).await;
}

/// Each table row becomes one accounting row. The header names the row fields; numeric cells are sent as numbers.
#[when(expr = "I import these accounting rows for period {word}")]
async fn import_rows(world: &mut LedgerWorld, period: String, step: &Step) {
    let table = step.table.as_ref().expect("The step needs a table of rows");
    let (header, body) = table.rows.split_first().expect("The table needs a header");
    let rows = body
        .iter()
        .map(|cells| {
            let row = header
                .iter()
                .zip(cells)
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(field, cell)| {
                    let value = f64::from_str(cell).map(|v| json!(v)).unwrap_or_else(|_| json!(cell));
                    (field.clone(), value)
                })
                .collect::<Map<String, Value>>();
            Value::Object(row)
        })
        .collect();
    let request =
        CsvImportRequest { project_id: Some(world.project_id.clone()), rows: Some(rows), reference_period: Some(period) };
    let result = world.api().import(request).await.expect("Import was rejected");
    world.last_result = Some(result);
}

#[then(expr = "{int} orders are processed")]
async fn orders_processed(world: &mut LedgerWorld, n: u64) {
    assert_eq!(world.last_result().orders_processed, n, "{:?}", world.last_result());
}

#[then(expr = "{int} ledger events are created")]
async fn events_created(world: &mut LedgerWorld, n: u64) {
    assert_eq!(world.last_result().ledger_events_created, n, "{:?}", world.last_result());
}

#[then(expr = "{int} orders are marked accounting complete")]
async fn orders_completed(world: &mut LedgerWorld, n: u64) {
    assert_eq!(world.last_result().orders_updated_to_accounting_complete, n);
}

#[then(expr = "{int} orders are skipped as duplicates")]
async fn orders_skipped(world: &mut LedgerWorld, n: u64) {
    assert_eq!(world.last_result().orders_skipped_duplicate, n);
}

#[then(expr = "{int} rows are unresolved")]
async fn rows_unresolved(world: &mut LedgerWorld, n: u64) {
    assert_eq!(world.last_result().rows_unresolved, n);
}

#[then(expr = "the import reports {int} errors")]
async fn import_errors(world: &mut LedgerWorld, n: usize) {
    assert_eq!(world.last_result().errors.len(), n, "{:?}", world.last_result().errors);
}

#[then(expr = "the import totals show a producer net of {float} BRL")]
async fn producer_net_total(world: &mut LedgerWorld, amount: f64) {
    assert_eq!(world.last_result().totals.producer_net_brl, money(amount));
}

#[then(expr = "order {word} has status {word}")]
async fn order_status(world: &mut LedgerWorld, tx: String, status: String) {
    let order = fetch_order(world, &tx).await;
    assert_eq!(order.ledger_status.to_string(), status);
}

#[then(expr = "order {word} has a producer net of {float} BRL")]
async fn order_producer_net(world: &mut LedgerWorld, tx: String, amount: f64) {
    let order = fetch_order(world, &tx).await;
    assert_eq!(order.producer_net_brl, Some(money(amount)));
}

#[then(expr = "order {word} has {int} {word} ledger events")]
async fn ledger_events(world: &mut LedgerWorld, tx: String, n: usize, origin: String) {
    let origin = SourceOrigin::from_str(&origin).expect("Not a source origin");
    let order = fetch_order(world, &tx).await;
    let events = world.db().fetch_ledger_events_for_order(order.id).await.expect("Error fetching ledger events");
    assert_eq!(events.iter().filter(|e| e.source_origin == origin).count(), n);
}
