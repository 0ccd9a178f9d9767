//! Per-item outcomes and the batch summary they accumulate into.

use std::fmt;
use std::path::PathBuf;

/// What happened, or will happen, to one item of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconciliationDecision {
    Fetch,
    SkipExisting,
    Fail(String),
}

/// The settled outcome of one batch item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemOutcome {
    pub reference: String,
    pub target: PathBuf,
    pub decision: ReconciliationDecision,
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.decision {
            ReconciliationDecision::Fetch => {
                write!(f, "- Downloaded {} -> {}", self.reference, self.target.display())
            }
            ReconciliationDecision::SkipExisting => write!(
                f,
                "- Skipping {} ({} already exists). Use --overwrite to re-download.",
                self.reference,
                self.target.display()
            ),
            ReconciliationDecision::Fail(reason) => {
                write!(f, "- Failed {}: {}", self.reference, reason)
            }
        }
    }
}

/// Counts of a batch run. Partial progress is kept; nothing is rolled back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub fetched: usize,
    pub skipped: usize,
    /// References of failed items, in processing order.
    pub failed: Vec<String>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &ItemOutcome) {
        match &outcome.decision {
            ReconciliationDecision::Fetch => self.fetched += 1,
            ReconciliationDecision::SkipExisting => self.skipped += 1,
            ReconciliationDecision::Fail(_) => self.failed.push(outcome.reference.clone()),
        }
    }

    pub fn total(&self) -> usize {
        self.fetched + self.skipped + self.failed.len()
    }

    /// Returns true if no item failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Done. downloaded={} skipped={} failed={}",
            self.fetched,
            self.skipped,
            self.failed.len()
        )?;
        for reference in &self.failed {
            writeln!(f, "  failed: {reference}")?;
        }
        Ok(())
    }
}
