//! Reconciliation of remote listings against local state.
//!
//! Batches are two-level: the outer `Result` of a batch runner is a hard
//! abort (broken listing, missing tool), while per-item failures are recorded
//! in the returned [`BatchSummary`] and processing carries on.

pub mod report;

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{OperationKind, SyncError};
use crate::ident::{DatasetReference, KernelRef};
use crate::remote::{FetchTarget, ListQuery, NotebookLanguage, Remote, RemoteItem};
use crate::transfer::{self, FetchReport};

pub use report::{BatchSummary, ItemOutcome, ReconciliationDecision};

/// Lazy, page-by-page notebook listing.
///
/// Pages are requested only as items are consumed, starting at page 1 and
/// stopping at the first empty page. Items the query does not admit are
/// filtered out. A failing page yields a single `ListingFailed` and ends the
/// iteration.
pub struct Listing<'a> {
    remote: &'a dyn Remote,
    query: ListQuery,
    next_page: u32,
    buffer: VecDeque<RemoteItem>,
    done: bool,
}

impl<'a> Listing<'a> {
    pub fn new(remote: &'a dyn Remote, query: ListQuery) -> Self {
        Self {
            remote,
            query,
            next_page: 1,
            buffer: VecDeque::new(),
            done: false,
        }
    }
}

impl Iterator for Listing<'_> {
    type Item = Result<RemoteItem, SyncError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }

            let page = self.next_page;
            match self.remote.list_page(&self.query, page) {
                Ok(items) if items.is_empty() => {
                    tracing::debug!(page, "listing exhausted");
                    self.done = true;
                }
                Ok(items) => {
                    tracing::debug!(page, count = items.len(), "listing page received");
                    self.next_page += 1;
                    let query = &self.query;
                    self.buffer
                        .extend(items.into_iter().filter(|item| query.admits(item)));
                }
                Err(err) => {
                    self.done = true;
                    let err = match err {
                        SyncError::ListingFailed { .. } => err,
                        other => SyncError::ListingFailed {
                            page,
                            message: other.to_string(),
                        },
                    };
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Decide what to do with an item whose local file would be `target`.
pub fn decide(target: &Path, overwrite: bool) -> ReconciliationDecision {
    if target.exists() && !overwrite {
        ReconciliationDecision::SkipExisting
    } else {
        ReconciliationDecision::Fetch
    }
}

/// Local path of a listed notebook.
pub fn notebook_target(destination: &Path, item: &RemoteItem) -> PathBuf {
    destination.join(item.file_name())
}

/// Download every listed notebook that is not already present.
///
/// `on_item` is called as soon as each item is settled.
pub fn sync_notebooks<I>(
    remote: &dyn Remote,
    items: I,
    destination: &Path,
    overwrite: bool,
    mut on_item: impl FnMut(&ItemOutcome),
) -> Result<BatchSummary, SyncError>
where
    I: IntoIterator<Item = Result<RemoteItem, SyncError>>,
{
    let mut summary = BatchSummary::new();
    for item in items {
        let item = item?;
        let target = notebook_target(destination, &item);
        let outcome = process(
            remote,
            FetchTarget::Kernel(item.reference),
            target,
            destination,
            overwrite,
            OperationKind::Notebook,
        )?;
        summary.record(&outcome);
        on_item(&outcome);
    }
    Ok(summary)
}

/// Download one named notebook, bypassing the listing.
///
/// Without a listing the language is unknown, so the existence check assumes
/// the default notebook extension.
pub fn sync_single_notebook(
    remote: &dyn Remote,
    kernel: &KernelRef,
    destination: &Path,
    overwrite: bool,
    mut on_item: impl FnMut(&ItemOutcome),
) -> Result<BatchSummary, SyncError> {
    let target = destination.join(format!(
        "{}{}",
        kernel.slug,
        NotebookLanguage::default().extension()
    ));
    let outcome = process(
        remote,
        FetchTarget::Kernel(kernel.clone()),
        target,
        destination,
        overwrite,
        OperationKind::Notebook,
    )?;

    let mut summary = BatchSummary::new();
    summary.record(&outcome);
    on_item(&outcome);
    Ok(summary)
}

/// Download each requested dataset into its destination.
///
/// A dataset whose destination already holds files is skipped unless
/// `overwrite` is set.
pub fn sync_datasets(
    remote: &dyn Remote,
    datasets: &[DatasetReference],
    default_root: &Path,
    overwrite: bool,
    mut on_item: impl FnMut(&ItemOutcome),
) -> Result<BatchSummary, SyncError> {
    let mut summary = BatchSummary::new();
    for dataset in datasets {
        let destination = dataset.destination_or(default_root);
        let decision = if has_entries(&destination) {
            decide(&destination, overwrite)
        } else {
            ReconciliationDecision::Fetch
        };

        let outcome = match decision {
            ReconciliationDecision::Fetch => settle(
                dataset.reference(),
                destination.clone(),
                transfer::fetch(remote, &FetchTarget::Dataset(dataset.clone()), &destination),
                OperationKind::Dataset,
            )?,
            other => ItemOutcome {
                reference: dataset.reference(),
                target: destination,
                decision: other,
            },
        };
        summary.record(&outcome);
        on_item(&outcome);
    }
    Ok(summary)
}

fn process(
    remote: &dyn Remote,
    target: FetchTarget,
    local_path: PathBuf,
    destination: &Path,
    overwrite: bool,
    kind: OperationKind,
) -> Result<ItemOutcome, SyncError> {
    let reference = match &target {
        FetchTarget::Kernel(kernel) => kernel.to_string(),
        FetchTarget::Dataset(dataset) => dataset.reference(),
        FetchTarget::Competition(id) => id.clone(),
    };

    match decide(&local_path, overwrite) {
        ReconciliationDecision::Fetch => {
            let result = transfer::fetch(remote, &target, destination);
            settle(reference, local_path, result, kind)
        }
        decision => {
            tracing::debug!(%reference, path = %local_path.display(), "already present");
            Ok(ItemOutcome {
                reference,
                target: local_path,
                decision,
            })
        }
    }
}

fn settle(
    reference: String,
    target: PathBuf,
    result: Result<FetchReport, SyncError>,
    kind: OperationKind,
) -> Result<ItemOutcome, SyncError> {
    let decision = match result {
        Ok(_) => ReconciliationDecision::Fetch,
        Err(err) if err.aborts(kind) => return Err(err),
        Err(err) => {
            tracing::error!(%reference, error = %err, "transfer failed");
            ReconciliationDecision::Fail(err.to_string())
        }
    };
    Ok(ItemOutcome {
        reference,
        target,
        decision,
    })
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
