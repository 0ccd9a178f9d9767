use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SyncError;

/// A dataset requested for download, with an optional destination override.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetReference {
    pub owner: String,
    pub name: String,
    pub destination: Option<PathBuf>,
}

impl DatasetReference {
    /// Destination directory: the override if one was given, else `root/<name>`.
    pub fn destination_or(&self, root: &Path) -> PathBuf {
        self.destination
            .clone()
            .unwrap_or_else(|| root.join(&self.name))
    }

    /// The `owner/name` form the remote service expects.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for DatasetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a comma-separated list of `owner/name[:destination]` entries.
///
/// Whitespace around entries is trimmed and empty entries are dropped. Only
/// the first `:` separates the reference from its destination, so the
/// destination itself may contain further `:` or `/` characters.
pub fn parse_dataset_refs(raw: &str) -> Result<Vec<DatasetReference>, SyncError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_entry)
        .collect()
}

fn parse_entry(entry: &str) -> Result<DatasetReference, SyncError> {
    let (reference, destination) = match entry.split_once(':') {
        Some((reference, destination)) => {
            let destination = destination.trim();
            (
                reference.trim(),
                (!destination.is_empty()).then(|| PathBuf::from(destination)),
            )
        }
        None => (entry, None),
    };

    let invalid = || SyncError::InvalidReference {
        input: reference.to_string(),
        message: "expected format <owner>/<dataset>".to_string(),
    };

    let (owner, name) = reference.split_once('/').ok_or_else(invalid)?;
    let (owner, name) = (owner.trim(), name.trim());
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return Err(invalid());
    }

    Ok(DatasetReference {
        owner: owner.to_string(),
        name: name.to_string(),
        destination,
    })
}

/// Entry point for fuzzing the dataset reference parser.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_dataset_refs(raw: &str) -> Result<Vec<DatasetReference>, SyncError> {
    parse_dataset_refs(raw)
}
