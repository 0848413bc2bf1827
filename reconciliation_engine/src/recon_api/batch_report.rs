//! Per-unit outcomes of a batch run, and their tally.
use serde::Serialize;

/// What happened to one row (CSV import) or one raw event (replay).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Created,
    /// The unit had already been reconciled and was left untouched
    SkippedDuplicate,
    /// The unit refers to something this project does not know about
    SkippedUnresolvable(String),
    /// The unit could not be processed. The message carries enough context to retry it.
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchTally {
    pub created: u64,
    pub skipped_duplicate: u64,
    pub skipped_unresolvable: u64,
    pub failed: u64,
    pub errors: Vec<String>,
}

impl BatchTally {
    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Created => self.created += 1,
            UnitOutcome::SkippedDuplicate => self.skipped_duplicate += 1,
            UnitOutcome::SkippedUnresolvable(_) => self.skipped_unresolvable += 1,
            UnitOutcome::Failed(msg) => {
                self.failed += 1;
                self.errors.push(msg);
            },
        }
    }

    pub fn total(&self) -> u64 {
        self.created + self.skipped_duplicate + self.skipped_unresolvable + self.failed
    }
}

impl Extend<UnitOutcome> for BatchTally {
    fn extend<T: IntoIterator<Item = UnitOutcome>>(&mut self, iter: T) {
        iter.into_iter().for_each(|o| self.record(o));
    }
}
