use sqlx::SqliteConnection;

use crate::{
    db::traits::ReconciliationDbError,
    db_types::{ClassifiableItem, ItemType, OrderItem, ProjectId},
};

pub async fn insert_order_item(
    order_id: i64,
    raw_event_id: Option<&str>,
    offer_name: Option<&str>,
    item_type: ItemType,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, ReconciliationDbError> {
    let item = sqlx::query_as(
        "INSERT INTO order_items (order_id, raw_event_id, offer_name, item_type) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(order_id)
    .bind(raw_event_id)
    .bind(offer_name)
    .bind(item_type)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order_item(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderItem>, ReconciliationDbError> {
    let item = sqlx::query_as("SELECT * FROM order_items WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(item)
}

/// One page of order items, joined with the payload of the raw event that produced each one. Items without a raw
/// event (or whose raw event is gone) carry a `NULL` payload.
pub async fn fetch_classifiable_items(
    project_id: Option<&ProjectId>,
    after_id: i64,
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<ClassifiableItem>, ReconciliationDbError> {
    let items = sqlx::query_as(
        r#"
        SELECT order_items.id, order_items.item_type, raw_events.payload
        FROM order_items
        JOIN orders ON orders.id = order_items.order_id
        LEFT JOIN raw_events ON raw_events.id = order_items.raw_event_id
        WHERE order_items.id > $1 AND ($2 IS NULL OR orders.project_id = $2)
        ORDER BY order_items.id ASC
        LIMIT $3
        "#,
    )
    .bind(after_id)
    .bind(project_id.map(ProjectId::as_str))
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Sets the item type of one order item. No other column, including `updated_at`, is touched.
pub async fn update_item_type(
    item_id: i64,
    item_type: ItemType,
    conn: &mut SqliteConnection,
) -> Result<bool, ReconciliationDbError> {
    let result = sqlx::query("UPDATE order_items SET item_type = $1 WHERE id = $2")
        .bind(item_type)
        .bind(item_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
