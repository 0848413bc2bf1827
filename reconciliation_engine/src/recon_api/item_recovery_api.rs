use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    classification::classify_item,
    db::traits::ItemManagement,
    db_types::{ClassifiableItem, ItemType, ProjectId},
    recon_api::{
        errors::ReconciliationError,
        options::{ReconciliationOptions, MAX_RECOVERY_BATCH_SIZE},
    },
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRecoveryRequest {
    pub project_id: Option<String>,
    pub dry_run: Option<bool>,
    pub batch_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecoveryStats {
    pub evaluated: u64,
    pub to_recover: u64,
    pub recovered: u64,
    /// Items with no raw event payload to classify from
    pub skipped: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTypeChange {
    pub id: i64,
    pub from: ItemType,
    pub to: ItemType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRecoveryResult {
    pub dry_run: bool,
    pub stats: ItemRecoveryStats,
    pub updates: Vec<ItemTypeChange>,
}

/// `ItemRecoveryApi` re-classifies order items from the payloads that produced them, and corrects the ones whose
/// stored type disagrees.
///
/// Only the item type is ever written, and only when it changes. Running the recovery twice is harmless: the second
/// run finds nothing to recover.
pub struct ItemRecoveryApi<B> {
    db: B,
    options: ReconciliationOptions,
}

impl<B> Debug for ItemRecoveryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ItemRecoveryApi")
    }
}

impl<B> ItemRecoveryApi<B> {
    pub fn new(db: B, options: ReconciliationOptions) -> Self {
        Self { db, options }
    }
}

impl<B> ItemRecoveryApi<B>
where B: ItemManagement
{
    pub async fn recover(&self, request: ItemRecoveryRequest) -> Result<ItemRecoveryResult, ReconciliationError> {
        let batch_size = match request.batch_size {
            Some(0) => return Err(ReconciliationError::InvalidRequest("batch_size must be positive".into())),
            Some(n) => n.min(MAX_RECOVERY_BATCH_SIZE),
            None => self.options.recovery_batch_size,
        };
        let dry_run = request.dry_run.unwrap_or(false);
        let project_id = request.project_id.filter(|p| !p.trim().is_empty()).map(ProjectId::from);
        info!(
            "🏷️ Recovering item types{} in pages of {batch_size}{}",
            project_id.as_ref().map(|p| format!(" for project {p}")).unwrap_or_default(),
            if dry_run { " (dry run)" } else { "" }
        );

        let mut result = ItemRecoveryResult { dry_run, ..Default::default() };
        let mut last_id = 0;
        let mut first_page = true;
        loop {
            let page = match self.db.fetch_classifiable_items(project_id.as_ref(), last_id, batch_size).await {
                Ok(page) => page,
                Err(e) if first_page => return Err(e.into()),
                Err(e) => {
                    warn!("🏷️ Could not fetch the page after item {last_id}. Stopping with partial results. {e}");
                    result.stats.errors += 1;
                    break;
                },
            };
            first_page = false;
            let page_len = page.len();
            for item in page {
                last_id = last_id.max(item.id);
                self.recover_item(item, dry_run, &mut result).await;
            }
            trace!("🏷️ Page complete. {} items evaluated so far", result.stats.evaluated);
            if page_len < batch_size as usize {
                break;
            }
        }
        let stats = &result.stats;
        info!(
            "🏷️ Item type recovery complete. {} evaluated, {} to recover, {} recovered, {} skipped, {} errors",
            stats.evaluated, stats.to_recover, stats.recovered, stats.skipped, stats.errors
        );
        Ok(result)
    }

    async fn recover_item(&self, item: ClassifiableItem, dry_run: bool, result: &mut ItemRecoveryResult) {
        result.stats.evaluated += 1;
        let Some(payload) = item.payload.as_deref() else {
            result.stats.skipped += 1;
            return;
        };
        let doc = match serde_json::from_str(payload) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("🏷️ Order item {} has an unreadable raw event payload. {e}", item.id);
                result.stats.errors += 1;
                return;
            },
        };
        let computed = classify_item(&doc);
        if computed == item.item_type {
            return;
        }
        result.stats.to_recover += 1;
        result.updates.push(ItemTypeChange { id: item.id, from: item.item_type, to: computed });
        if dry_run {
            return;
        }
        match self.db.update_item_type(item.id, computed).await {
            Ok(true) => {
                debug!("🏷️ Order item {} reclassified from {} to {computed}", item.id, item.item_type);
                result.stats.recovered += 1;
            },
            Ok(false) => {
                warn!("🏷️ Order item {} disappeared before it could be reclassified", item.id);
                result.stats.errors += 1;
            },
            Err(e) => {
                warn!("🏷️ Could not reclassify order item {}. {e}", item.id);
                result.stats.errors += 1;
            },
        }
    }
}
