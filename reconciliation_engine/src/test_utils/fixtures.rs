//! Seeding helpers for tests that run against a real database.
use chrono::{DateTime, Utc};
use recon_common::Money;
use serde_json::{json, Value};

use crate::{
    db::sqlite::{ledger, order_items, orders, projects, raw_events, sales_core_events},
    db_types::{
        ActorRole,
        ConfidenceLevel,
        ItemType,
        LedgerEventType,
        NewLedgerEvent,
        NewOrder,
        NewSalesCoreEvent,
        Order,
        OrderItem,
        Project,
        ProjectId,
        RawEvent,
        SourceOrigin,
    },
    SqliteDatabase,
};

pub async fn seed_project(db: &SqliteDatabase, id: &str, code: &str) -> Project {
    let project =
        Project { id: ProjectId::from(id), code: Some(code.to_string()), name: Some(format!("Project {code}")) };
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    projects::insert_project(&project, &mut conn).await.expect("Error inserting project");
    project
}

pub async fn seed_order(db: &SqliteDatabase, order: NewOrder) -> Order {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    orders::insert_order(&order, &mut conn).await.expect("Error inserting order")
}

/// Records the realtime sale event the webhook path would have written for `order`.
pub async fn seed_webhook_sale(db: &SqliteDatabase, order: &Order, amount: Money) {
    let event = NewLedgerEvent {
        project_id: order.project_id.clone(),
        order_id: order.id,
        transaction_id: order.transaction_id.clone(),
        provider: order.provider.clone(),
        provider_event_id: format!("hotmart:{}:sale", order.transaction_id),
        source_origin: SourceOrigin::Webhook,
        confidence_level: ConfidenceLevel::Realtime,
        event_type: LedgerEventType::Sale,
        actor_role: ActorRole::Producer,
        amount_brl: amount,
        amount_accounting: amount,
        accounting_currency: "BRL".to_string(),
        reference_period: None,
        provenance: json!({"source": "webhook"}),
        attribution: order.attribution.clone(),
    };
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    ledger::insert_events(&[event], &mut conn).await.expect("Error inserting webhook event");
}

pub async fn seed_raw_event(
    db: &SqliteDatabase,
    id: &str,
    project_id: &str,
    payload: &Value,
    received_at: DateTime<Utc>,
) -> RawEvent {
    let event = RawEvent {
        id: id.to_string(),
        project_id: ProjectId::from(project_id),
        provider: "hotmart".to_string(),
        payload: payload.to_string(),
        received_at,
    };
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    raw_events::insert_raw_event(&event, &mut conn).await.expect("Error inserting raw event");
    event
}

pub async fn seed_order_item(
    db: &SqliteDatabase,
    order_id: i64,
    raw_event_id: Option<&str>,
    item_type: ItemType,
) -> OrderItem {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    order_items::insert_order_item(order_id, raw_event_id, None, item_type, &mut conn)
        .await
        .expect("Error inserting order item")
}

pub async fn seed_sales_core_event(db: &SqliteDatabase, event: &NewSalesCoreEvent) -> i64 {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    sales_core_events::insert_sales_core_event(event, &mut conn).await.expect("Error inserting sale event")
}

/// An accounting export row in the shape the import endpoint receives.
pub fn accounting_row(transaction_id: &str, gross: f64, net: f64) -> Value {
    json!({
        "transaction_id": transaction_id,
        "gross_value": gross,
        "net_value": net,
        "net_value_brl": net,
        "platform_fee": gross - net,
        "original_currency": "BRL",
        "sale_date": "2024-03-05"
    })
}

/// A purchase notification as the sales platform delivers it.
pub fn purchase_notification(transaction_id: &str, value: f64, currency: &str, sck: &str) -> Value {
    json!({
        "event": "PURCHASE_APPROVED",
        "data": {
            "product": {"name": "Curso Completo"},
            "purchase": {
                "transaction": transaction_id,
                "price": {"value": value, "currency_value": currency},
                "offer": {"code": "abc123", "name": "Oferta principal"},
                "origin": {"sck": sck}
            },
            "commissions": [
                {"source": "MARKETPLACE", "value": value * 0.1, "currency_value": currency},
                {"source": "PRODUCER", "value": value * 0.9, "currency_value": currency}
            ]
        }
    })
}
