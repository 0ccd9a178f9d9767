use std::path::PathBuf;
use thiserror::Error;

use crate::reconcile::BatchSummary;

/// The kind of remote operation an error was raised under.
///
/// Whether a failure stops the whole run or only the current item depends on
/// this; see [`SyncError::aborts`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    /// Bulk, non-itemized download of a competition's files.
    Competition,
    /// One dataset out of a list of requested datasets.
    Dataset,
    /// One notebook out of a remote listing.
    Notebook,
    /// Publishing a single notebook.
    Publish,
}

/// The main error type for kaggle-sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {}", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("No valid entries found in config: {}", path.display())]
    ConfigEmpty { path: PathBuf },

    #[error("Failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Missing required keys: {}. Please update the config file.", missing.join(", "))]
    ConfigIncomplete { missing: Vec<String> },

    #[error("Invalid reference '{input}': {message}")]
    InvalidReference { input: String, message: String },

    #[error("{}", invalid_slug_message(slug, suggestion))]
    InvalidSlug { slug: String, suggestion: String },

    #[error("Failed to list notebooks (page {page}): {message}")]
    ListingFailed { page: u32, message: String },

    #[error("No files were downloaded for {target}")]
    NoPayload { target: String },

    #[error("Failed to extract {}: {message}", path.display())]
    CorruptArchive { path: PathBuf, message: String },

    #[error("Notebook not found: {}", path.display())]
    NotebookNotFound { path: PathBuf },

    #[error("Failed to write kernel metadata to {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("kaggle CLI failed with exit code {code} while pushing {reference}")]
    PublishFailed { reference: String, code: i32 },

    #[error(
        "kaggle CLI is not installed or not available in PATH ({program}). \
         Install it via `pip install kaggle` or use the Kaggle Docker image."
    )]
    RemoteToolUnavailable { program: String },

    #[error("kaggle CLI exited with {code} while running `{command}`. Check credentials and access.")]
    RemoteToolError { command: String, code: i32 },

    #[error("{} item(s) failed: {}", summary.failed.len(), summary.failed.join(", "))]
    BatchFailed { summary: BatchSummary },
}

fn invalid_slug_message(slug: &str, suggestion: &str) -> String {
    if suggestion.is_empty() {
        format!("Invalid slug '{slug}': it must contain at least one alphanumeric character.")
    } else {
        format!(
            "Invalid slug '{slug}'. Suggested slug: '{suggestion}'. \
             Use lowercase letters, numbers, and dashes only."
        )
    }
}

impl SyncError {
    /// Process exit code for this error.
    ///
    /// Failures of the external tool carry the tool's own code; everything
    /// else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::RemoteToolError { code, .. } | SyncError::PublishFailed { code, .. }
                if *code != 0 =>
            {
                *code
            }
            _ => 1,
        }
    }

    /// Returns true if this error must stop the whole run rather than only
    /// the item it was raised for.
    ///
    /// A missing tool or a broken listing is always fatal. Competition
    /// downloads and pushes are not itemized, so any failure there is fatal
    /// too. Dataset and notebook transfers record the failure and move on.
    pub fn aborts(&self, kind: OperationKind) -> bool {
        match self {
            SyncError::RemoteToolUnavailable { .. } | SyncError::ListingFailed { .. } => true,
            _ => matches!(kind, OperationKind::Competition | OperationKind::Publish),
        }
    }
}
