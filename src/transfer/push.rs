//! Publishing a local notebook.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SyncError;
use crate::ident::{KernelIdentity, KernelRef};
use crate::remote::{NotebookLanguage, Remote};

use super::staging_dir;

/// File name the publish operation reads the manifest from.
pub const MANIFEST_FILE_NAME: &str = "kernel-metadata.json";

/// Execution settings for a published notebook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KernelOptions {
    pub is_private: bool,
    pub enable_gpu: bool,
    pub enable_internet: bool,
}

/// Everything needed to publish one notebook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushRequest {
    pub identity: KernelIdentity,
    pub notebook: PathBuf,
    pub options: KernelOptions,
    pub competition: Option<String>,
    pub dataset_sources: Vec<String>,
}

/// Result of a successful push.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushReport {
    pub reference: KernelRef,
    pub url: String,
}

/// The `kernel-metadata.json` record consumed by `kaggle kernels push`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KernelManifest {
    pub id: String,
    pub title: String,
    pub code_file: String,
    pub language: &'static str,
    pub kernel_type: &'static str,
    pub is_private: bool,
    pub enable_gpu: bool,
    pub enable_tpu: bool,
    pub enable_internet: bool,
    pub keywords: Vec<String>,
    pub dataset_sources: Vec<String>,
    pub kernel_sources: Vec<String>,
    pub competition_sources: Vec<String>,
    pub model_sources: Vec<String>,
    pub docker_image: &'static str,
}

impl KernelManifest {
    pub fn new(request: &PushRequest, code_file: &str) -> Self {
        let language = NotebookLanguage::from_path(Path::new(code_file));
        Self {
            id: request.identity.reference().to_string(),
            title: request.identity.title.clone(),
            code_file: code_file.to_string(),
            language: language.name(),
            kernel_type: "notebook",
            is_private: request.options.is_private,
            enable_gpu: request.options.enable_gpu,
            enable_tpu: false,
            enable_internet: request.options.enable_internet,
            keywords: Vec::new(),
            dataset_sources: request.dataset_sources.clone(),
            kernel_sources: Vec::new(),
            competition_sources: request.competition.iter().cloned().collect(),
            model_sources: Vec::new(),
            docker_image: "python",
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), SyncError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SyncError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Stage the notebook with its manifest and publish it.
///
/// A non-zero exit of the publish tool becomes `PublishFailed`. The staging
/// directory is discarded whatever the outcome.
pub fn push(remote: &dyn Remote, request: &PushRequest) -> Result<PushReport, SyncError> {
    if !request.notebook.is_file() {
        return Err(SyncError::NotebookNotFound {
            path: request.notebook.clone(),
        });
    }
    let code_file = request
        .notebook
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| SyncError::NotebookNotFound {
            path: request.notebook.clone(),
        })?;

    let staging = staging_dir("kaggle-kernel-")?;
    fs::copy(&request.notebook, staging.path().join(&code_file))?;
    KernelManifest::new(request, &code_file).write(&staging.path().join(MANIFEST_FILE_NAME))?;

    let reference = request.identity.reference();
    tracing::info!(%reference, staging = %staging.path().display(), "pushing kernel");
    remote
        .publish(staging.path())
        .map_err(|err| match err {
            SyncError::RemoteToolError { code, .. } => SyncError::PublishFailed {
                reference: reference.to_string(),
                code,
            },
            other => other,
        })?;

    staging.close()?;
    Ok(PushReport {
        url: format!("https://www.kaggle.com/code/{reference}"),
        reference,
    })
}
