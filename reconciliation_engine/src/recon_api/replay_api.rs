use std::fmt::Debug;

use chrono::Utc;
use log::*;
use recon_common::Money;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    attribution::Attribution,
    currency::CurrencyNormalizer,
    db::traits::{ReplayDatabase, ReplayUpdate},
    db_types::{Project, ProjectId, ProjectLookup, RawEvent, TransactionId},
    financials::FinancialBreakdown,
    helpers::payload::{decimal_at, purchase_section, str_at, text_at},
    recon_api::{
        batch_report::{BatchTally, UnitOutcome},
        errors::ReconciliationError,
        options::{ProjectDirectory, ReconciliationOptions},
    },
};

/// Paths of the transaction id, relative to the purchase section of a notification.
const TRANSACTION_PATHS: [&[&str]; 2] = [&["transaction"], &["transaction_id"]];

/// Identifies the project to replay, either by id or by its short code. The id wins when both are given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayRequest {
    pub project_id: Option<String>,
    pub project_code: Option<String>,
}

impl ReplayRequest {
    /// Fills in any identifier this request lacks from `other`.
    pub fn or(self, other: ReplayRequest) -> ReplayRequest {
        ReplayRequest {
            project_id: self.project_id.or(other.project_id),
            project_code: self.project_code.or(other.project_code),
        }
    }
}

impl TryFrom<ReplayRequest> for ProjectLookup {
    type Error = ReconciliationError;

    fn try_from(req: ReplayRequest) -> Result<Self, Self::Error> {
        let non_blank = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        match (non_blank(req.project_id), non_blank(req.project_code)) {
            (Some(id), _) => Ok(ProjectLookup::Id(ProjectId::from(id))),
            (None, Some(code)) => Ok(ProjectLookup::Code(code)),
            (None, None) => Err(ReconciliationError::InvalidRequest("project_code or project_id is required".into())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResult {
    pub project_id: String,
    pub events_processed: u64,
    pub sales_updated: u64,
    pub core_events_updated: u64,
    pub ledger_updated: u64,
    /// Number of events that could not be processed
    pub errors: u64,
    /// Events that do not name a transaction
    pub events_skipped: u64,
}

/// `RawEventReplayApi` re-derives attribution and money fields from the raw event log and writes them back over the
/// order, sale event and ledger projections.
///
/// The replay is a repair tool. It is idempotent, and events are processed independently: a failure increments the
/// error count and the run carries on, keeping every write that already succeeded.
pub struct RawEventReplayApi<B> {
    db: B,
    normalizer: CurrencyNormalizer,
    directory: ProjectDirectory,
    options: ReconciliationOptions,
}

impl<B> Debug for RawEventReplayApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawEventReplayApi ({} fallback project codes)", self.directory.len())
    }
}

impl<B> RawEventReplayApi<B> {
    pub fn new(
        db: B,
        normalizer: CurrencyNormalizer,
        directory: ProjectDirectory,
        options: ReconciliationOptions,
    ) -> Self {
        Self { db, normalizer, directory, options }
    }
}

impl<B> RawEventReplayApi<B>
where B: ReplayDatabase
{
    /// Resolves a project from the datastore. Codes that are not in the datastore are looked up in the static
    /// directory. An unknown project is fatal.
    pub async fn resolve_project(&self, lookup: &ProjectLookup) -> Result<ProjectId, ReconciliationError> {
        if let Some(Project { id, .. }) = self.db.fetch_project(lookup).await? {
            return Ok(id);
        }
        match lookup {
            ProjectLookup::Code(code) => self.directory.resolve(code).cloned().ok_or_else(|| {
                warn!("🔁️ Project {lookup} is unknown to the datastore and to the fallback directory");
                ReconciliationError::ProjectNotFound(lookup.to_string())
            }),
            ProjectLookup::Id(_) => Err(ReconciliationError::ProjectNotFound(lookup.to_string())),
        }
    }

    /// Replays every raw event of the project received within the configured trailing window, oldest first.
    pub async fn replay(&self, lookup: &ProjectLookup) -> Result<ReplayResult, ReconciliationError> {
        let project_id = self.resolve_project(lookup).await?;
        let since = Utc::now() - self.options.replay_window;
        let events = self.db.fetch_raw_events_since(&project_id, since).await?;
        info!("🔁️ Replaying {} raw events for project {project_id} received since {since}", events.len());
        let mut result = ReplayResult { project_id: project_id.to_string(), ..Default::default() };
        let mut tally = BatchTally::default();
        for event in &events {
            let outcome = self.replay_event(event, &mut result).await;
            tally.record(outcome);
        }
        result.events_processed = tally.created;
        result.events_skipped = tally.skipped_unresolvable;
        result.errors = tally.failed;
        info!(
            "🔁️ Replay for project {project_id} complete. {} events processed, {} orders, {} sale events and {} \
             ledger rows updated, {} errors",
            result.events_processed,
            result.sales_updated,
            result.core_events_updated,
            result.ledger_updated,
            result.errors
        );
        Ok(result)
    }

    async fn replay_event(&self, event: &RawEvent, result: &mut ReplayResult) -> UnitOutcome {
        let doc = match event.document() {
            Ok(doc) => doc,
            Err(e) => {
                warn!("🔁️ Raw event {} has an unreadable payload. {e}", event.id);
                return UnitOutcome::Failed(format!("{}: {e}", event.id));
            },
        };
        let Some(update) = derive_update(&event.project_id, &doc, &self.normalizer) else {
            debug!("🔁️ Raw event {} does not name a transaction. Skipping.", event.id);
            return UnitOutcome::SkippedUnresolvable(event.id.clone());
        };
        let mut failures = Vec::new();
        match self.db.update_order_projection(&update).await {
            Ok(n) => result.sales_updated += n,
            Err(e) => failures.push(format!("orders: {e}")),
        }
        match self.db.update_sales_core_event(&update).await {
            Ok(n) => result.core_events_updated += n,
            Err(e) => failures.push(format!("sales_core_events: {e}")),
        }
        match self.db.update_ledger_attribution(&update).await {
            Ok(n) => result.ledger_updated += n,
            Err(e) => failures.push(format!("finance_ledger: {e}")),
        }
        if failures.is_empty() {
            trace!("🔁️ Raw event {} replayed over {}", event.id, update.transaction_id);
            UnitOutcome::Created
        } else {
            let msg = format!("{} ({}): {}", event.id, update.transaction_id.as_str(), failures.join("; "));
            warn!("🔁️ Replay of raw event {msg}");
            UnitOutcome::Failed(msg)
        }
    }
}

/// Re-derives everything a raw event says about its transaction. Returns `None` if the payload does not name a
/// transaction.
pub fn derive_update(project_id: &ProjectId, doc: &Value, normalizer: &CurrencyNormalizer) -> Option<ReplayUpdate> {
    let purchase = purchase_section(doc);
    let transaction_id = TRANSACTION_PATHS.iter().find_map(|p| text_at(purchase, p))?;
    let currency = str_at(purchase, &["price", "currency_value"]).unwrap_or(normalizer.settlement_currency());
    let gross_brl = decimal_at(purchase, &["price", "value"])
        .and_then(|v| Money::try_from(v).ok())
        .map(|gross| normalizer.normalize(gross, currency).settlement_amount);
    let breakdown = FinancialBreakdown::from_payload(doc).normalized(currency, normalizer);
    Some(ReplayUpdate {
        project_id: project_id.clone(),
        transaction_id: TransactionId::from(transaction_id),
        attribution: Attribution::from_payload(doc),
        gross_brl,
        breakdown,
    })
}
