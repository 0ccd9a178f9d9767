//! The boundary to the remote platform.
//!
//! All remote operations go through the [`Remote`] trait so the
//! reconciliation and transfer logic can run against a fake in tests. The
//! production backend lives in [`kaggle`].

pub mod kaggle;

use std::fmt;
use std::path::Path;

use crate::error::SyncError;
use crate::ident::{DatasetReference, KernelRef};

pub use kaggle::Kaggle;

/// Notebook languages the platform reports, mapped to file extensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NotebookLanguage {
    #[default]
    Python,
    R,
    Julia,
}

impl NotebookLanguage {
    /// Map a reported language name. Unknown or missing names fall back to
    /// Python, the platform's primary notebook language.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_ascii_lowercase()).as_deref() {
            Some("r") => NotebookLanguage::R,
            Some("julia") => NotebookLanguage::Julia,
            _ => NotebookLanguage::Python,
        }
    }

    /// Language of a local notebook file, judged by its extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("irnb") => NotebookLanguage::R,
            Some("ijlnb") => NotebookLanguage::Julia,
            _ => NotebookLanguage::Python,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NotebookLanguage::Python => "python",
            NotebookLanguage::R => "r",
            NotebookLanguage::Julia => "julia",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            NotebookLanguage::Python => ".ipynb",
            NotebookLanguage::R => ".irnb",
            NotebookLanguage::Julia => ".ijlnb",
        }
    }
}

/// One notebook from a remote listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteItem {
    pub reference: KernelRef,
    pub language: NotebookLanguage,
    pub is_private: bool,
}

impl RemoteItem {
    /// Local file name the notebook is stored under.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.reference.slug, self.language.extension())
    }
}

/// Parameters of a notebook listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    /// Whose notebooks to list.
    pub owner: String,
    /// The authenticated account; only its private notebooks are admitted.
    pub caller: String,
    pub include_private: bool,
    pub page_size: u32,
}

impl ListQuery {
    /// Private notebooks are only admitted when asked for and owned by the
    /// caller.
    pub fn admits(&self, item: &RemoteItem) -> bool {
        !item.is_private || (self.include_private && item.reference.owner == self.caller)
    }
}

/// What a fetch transfer downloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchTarget {
    Competition(String),
    Dataset(DatasetReference),
    Kernel(KernelRef),
}

impl FetchTarget {
    /// Prefix for the staging directory of this kind of fetch.
    pub fn staging_prefix(&self) -> &'static str {
        match self {
            FetchTarget::Competition(_) => "kaggle-download-",
            FetchTarget::Dataset(_) => "kaggle-input-",
            FetchTarget::Kernel(_) => "kaggle-kernel-pull-",
        }
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchTarget::Competition(id) => write!(f, "competition {id}"),
            FetchTarget::Dataset(reference) => write!(f, "dataset {reference}"),
            FetchTarget::Kernel(reference) => write!(f, "notebook {reference}"),
        }
    }
}

/// Operations the remote platform offers.
pub trait Remote {
    /// Fail fast if the remote tooling cannot be used at all.
    fn ensure_available(&self) -> Result<(), SyncError>;

    /// Fetch one page (1-based) of notebooks. An empty page ends the listing.
    fn list_page(&self, query: &ListQuery, page: u32) -> Result<Vec<RemoteItem>, SyncError>;

    /// Download the payload of `target` into the `staging` directory.
    fn download(&self, target: &FetchTarget, staging: &Path) -> Result<(), SyncError>;

    /// Publish the notebook assembled in `staging`.
    fn publish(&self, staging: &Path) -> Result<(), SyncError>;
}
