//! Kaggle backend: REST API for listings, the `kaggle` tool for transfers.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

use base64::Engine;
use serde::Deserialize;

use crate::config::EffectiveConfig;
use crate::error::SyncError;
use crate::ident::KernelRef;

use super::{FetchTarget, ListQuery, NotebookLanguage, Remote, RemoteItem};

pub const DEFAULT_PROGRAM: &str = "kaggle";
pub const DEFAULT_API_URL: &str = "https://www.kaggle.com/api/v1";

/// The production [`Remote`].
#[derive(Clone)]
pub struct Kaggle {
    program: String,
    api_url: String,
    username: String,
    key: String,
}

impl std::fmt::Debug for Kaggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kaggle")
            .field("program", &self.program)
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Kaggle {
    pub fn new(config: &EffectiveConfig) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            username: config.account_name().to_string(),
            key: config.account_key().to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn basic_auth(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.key);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }

    fn run_tool(&self, args: &[&str], staging: &Path) -> Result<(), SyncError> {
        let command = format!("{} {}", self.program, args.join(" "));
        let mut argv: Vec<OsString> = args.iter().map(OsString::from).collect();
        argv.push("-p".into());
        argv.push(staging.as_os_str().to_owned());

        tracing::debug!(%command, staging = %staging.display(), "invoking kaggle CLI");
        let status = Command::new(&self.program)
            .args(&argv)
            .status()
            .map_err(|source| self.spawn_error(source))?;

        if status.success() {
            Ok(())
        } else {
            Err(SyncError::RemoteToolError {
                command,
                code: status.code().unwrap_or(1),
            })
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> SyncError {
        if source.kind() == ErrorKind::NotFound {
            SyncError::RemoteToolUnavailable {
                program: self.program.clone(),
            }
        } else {
            SyncError::Io(source)
        }
    }
}

impl Remote for Kaggle {
    fn ensure_available(&self) -> Result<(), SyncError> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| self.spawn_error(source))?;

        if status.success() {
            Ok(())
        } else {
            Err(SyncError::RemoteToolError {
                command: format!("{} --version", self.program),
                code: status.code().unwrap_or(1),
            })
        }
    }

    fn list_page(&self, query: &ListQuery, page: u32) -> Result<Vec<RemoteItem>, SyncError> {
        let listing_failed = |message: String| SyncError::ListingFailed { page, message };

        let mut url = url::Url::parse(&format!("{}/kernels/list", self.api_url))
            .map_err(|source| listing_failed(format!("invalid API URL: {source}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.to_string());
            pairs.append_pair("pageSize", &query.page_size.to_string());
            pairs.append_pair("kernelType", "notebook");
            pairs.append_pair("sortBy", "dateCreated");
            if query.include_private {
                pairs.append_pair("group", "profile");
            } else {
                pairs.append_pair("user", &query.owner);
            }
        }

        tracing::debug!(page, url = %url, "fetching notebook listing page");
        let agent = ureq::Agent::new_with_defaults();
        let mut response = agent
            .get(url.as_str())
            .header("Authorization", &self.basic_auth())
            .call()
            .map_err(|source| listing_failed(source.to_string()))?;

        let records = response
            .body_mut()
            .read_json::<Vec<KernelRecord>>()
            .map_err(|source| listing_failed(format!("unexpected response: {source}")))?;

        Ok(records.into_iter().filter_map(KernelRecord::into_item).collect())
    }

    fn download(&self, target: &FetchTarget, staging: &Path) -> Result<(), SyncError> {
        match target {
            FetchTarget::Competition(id) => {
                self.run_tool(&["competitions", "download", "-c", id.as_str()], staging)
            }
            FetchTarget::Dataset(dataset) => {
                let reference = dataset.reference();
                self.run_tool(&["datasets", "download", "-d", reference.as_str()], staging)
            }
            FetchTarget::Kernel(kernel) => {
                let reference = kernel.to_string();
                self.run_tool(&["kernels", "pull", reference.as_str()], staging)
            }
        }
    }

    fn publish(&self, staging: &Path) -> Result<(), SyncError> {
        self.run_tool(&["kernels", "push"], staging)
    }
}

/// Notebook metadata as returned by the listing endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KernelRecord {
    #[serde(rename = "ref", default)]
    reference: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default, alias = "is_private")]
    is_private: Option<bool>,
}

impl KernelRecord {
    fn into_item(self) -> Option<RemoteItem> {
        let raw = self.reference?;
        let reference = match KernelRef::parse(&raw, "") {
            Ok(reference) => reference,
            Err(err) => {
                tracing::warn!(reference = %raw, error = %err, "dropping malformed listing entry");
                return None;
            }
        };

        Some(RemoteItem {
            reference,
            language: NotebookLanguage::from_name(self.language.as_deref()),
            is_private: self.is_private.unwrap_or(false),
        })
    }
}
