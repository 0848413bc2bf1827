use crate::{
    db::traits::ReconciliationDbError,
    db_types::{ClassifiableItem, ItemType, ProjectId},
};

#[allow(async_fn_in_trait)]
pub trait ItemManagement {
    /// Fetches up to `limit` order items with an id greater than `after_id`, in ascending id order, each joined with
    /// the payload of the raw event that produced it. Items are optionally restricted to one project.
    async fn fetch_classifiable_items(
        &self,
        project_id: Option<&ProjectId>,
        after_id: i64,
        limit: u32,
    ) -> Result<Vec<ClassifiableItem>, ReconciliationDbError>;

    /// Sets the item type of one order item. No other column is modified. Returns false if the item does not exist.
    async fn update_item_type(&self, item_id: i64, item_type: ItemType) -> Result<bool, ReconciliationDbError>;
}
