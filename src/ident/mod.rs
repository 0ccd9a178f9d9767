//! Parsing and validation of user-supplied identifiers.
//!
//! Everything here is pure: identifiers are checked for structural
//! well-formedness only, and nothing contacts the remote service.

pub mod dataset;
pub mod slug;

use std::fmt;

use crate::error::SyncError;

pub use dataset::{parse_dataset_refs, DatasetReference};
pub use slug::{default_title, normalize_slug, reconcile_title, validate_slug, TitleDecision};

/// A notebook addressed as `owner/slug`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KernelRef {
    pub owner: String,
    pub slug: String,
}

impl KernelRef {
    /// Parse `owner/slug`, or a bare `slug` owned by `default_owner`.
    pub fn parse(input: &str, default_owner: &str) -> Result<Self, SyncError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SyncError::InvalidReference {
                input: input.to_string(),
                message: "kernel reference must not be empty".to_string(),
            });
        }

        let (owner, slug) = match trimmed.split_once('/') {
            Some((owner, slug)) => (owner.trim(), slug.trim()),
            None => (default_owner.trim(), trimmed),
        };

        if owner.is_empty() || slug.is_empty() || slug.contains('/') {
            return Err(SyncError::InvalidReference {
                input: input.to_string(),
                message: "expected kernel reference in '<owner>/<slug>' form".to_string(),
            });
        }

        Ok(Self {
            owner: owner.to_string(),
            slug: slug.to_string(),
        })
    }
}

impl fmt::Display for KernelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.slug)
    }
}

/// A notebook identity ready to be published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelIdentity {
    pub owner: String,
    pub slug: String,
    pub title: String,
}

impl KernelIdentity {
    /// Validate `slug` and reconcile `title` with it.
    ///
    /// The slug is never corrected; an invalid one is rejected with a
    /// suggestion. The returned [`TitleDecision`] tells the caller whether the
    /// title had to be replaced.
    pub fn new(owner: &str, slug: &str, title: &str) -> Result<(Self, TitleDecision), SyncError> {
        validate_slug(slug)?;
        let decision = reconcile_title(title, slug);
        let identity = Self {
            owner: owner.to_string(),
            slug: slug.to_string(),
            title: decision.title().to_string(),
        };
        Ok((identity, decision))
    }

    pub fn reference(&self) -> KernelRef {
        KernelRef {
            owner: self.owner.clone(),
            slug: self.slug.clone(),
        }
    }
}
