//! Transfer executor.
//!
//! Every transfer runs in its own freshly created staging directory. The
//! directory is a [`tempfile::TempDir`], so it is removed on every exit path,
//! including early returns on error.

pub mod push;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::SyncError;
use crate::remote::{FetchTarget, Remote};

pub use push::{push, KernelManifest, KernelOptions, PushReport, PushRequest, MANIFEST_FILE_NAME};

/// What a fetch placed into its destination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Names of the archives that were extracted.
    pub archives: Vec<String>,
    /// Names of top-level files or directories copied as-is.
    pub copied: Vec<String>,
}

/// Create a uniquely named staging directory.
pub fn staging_dir(prefix: &str) -> Result<TempDir, SyncError> {
    let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
    tracing::trace!(path = %dir.path().display(), "staging directory created");
    Ok(dir)
}

/// Download `target` and unpack it into `destination`.
pub fn fetch(
    remote: &dyn Remote,
    target: &FetchTarget,
    destination: &Path,
) -> Result<FetchReport, SyncError> {
    fs::create_dir_all(destination)?;
    let staging = staging_dir(target.staging_prefix())?;

    tracing::info!(%target, destination = %destination.display(), "downloading");
    remote.download(target, staging.path())?;
    let report = unpack(staging.path(), destination, &target.to_string())?;

    staging.close()?;
    Ok(report)
}

/// Move the payload of a staging area into `destination`.
///
/// `.zip` archives are extracted; any other file or directory is copied in,
/// merging directories and overwriting files. An empty staging area is a
/// `NoPayload` failure.
pub fn unpack(staging: &Path, destination: &Path, label: &str) -> Result<FetchReport, SyncError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(staging)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();

    if entries.is_empty() {
        return Err(SyncError::NoPayload {
            target: label.to_string(),
        });
    }

    let mut report = FetchReport::default();
    for entry in entries {
        let name = entry
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if entry.is_file() && is_archive(&entry) {
            tracing::info!(archive = %name, "extracting");
            extract_archive(&entry, destination)?;
            report.archives.push(name);
        } else {
            copy_entry(&entry, &destination.join(&name))?;
            report.copied.push(name);
        }
    }

    Ok(report)
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

fn extract_archive(archive_path: &Path, destination: &Path) -> Result<(), SyncError> {
    let corrupt = |message: String| SyncError::CorruptArchive {
        path: archive_path.to_path_buf(),
        message,
    };

    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| corrupt(source.to_string()))?;
    archive
        .extract(destination)
        .map_err(|source| corrupt(source.to_string()))
}

fn copy_entry(source: &Path, target: &Path) -> Result<(), SyncError> {
    if !source.is_dir() {
        fs::copy(source, target)?;
        return Ok(());
    }

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|err| {
            err.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop while copying"))
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(std::io::Error::other)?;
        let out = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&out)?;
        } else {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &out)?;
        }
    }
    Ok(())
}
