//! Semantic classification of order line items.
//!
//! The decision is made purely from the payload of the raw event that produced the item, so it can be re-run at any
//! time over previously classified items.
use serde_json::Value;

use crate::{
    db_types::ItemType,
    helpers::payload::{bool_at, purchase_section, str_at, text_at},
};

/// Classifies the item bought in a provider notification. The first matching rule wins:
///
/// 1. an offer name containing "upsell" (any case) → [`ItemType::Upsell`]
/// 2. an offer name containing "downsell" → [`ItemType::Downsell`]
/// 3. an order bump that names its parent transaction → [`ItemType::Bump`]
/// 4. anything else → [`ItemType::Main`]
///
/// An order bump without a parent transaction is treated as a self-contained primary purchase.
pub fn classify_item(doc: &Value) -> ItemType {
    let purchase = purchase_section(doc);
    let offer_name = str_at(purchase, &["offer", "name"]).map(str::to_lowercase).unwrap_or_default();
    if offer_name.contains("upsell") {
        return ItemType::Upsell;
    }
    if offer_name.contains("downsell") {
        return ItemType::Downsell;
    }
    let is_bump = bool_at(purchase, &["order_bump", "is_order_bump"]).unwrap_or(false);
    let has_parent = text_at(purchase, &["order_bump", "parent_purchase_transaction"]).is_some();
    if is_bump && has_parent {
        ItemType::Bump
    } else {
        ItemType::Main
    }
}
