#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use kaggle_sync::ident::KernelRef;
use kaggle_sync::remote::{FetchTarget, ListQuery, NotebookLanguage, Remote, RemoteItem};
use kaggle_sync::SyncError;

/// What the fake service hands back for one download.
#[derive(Clone, Debug)]
pub enum Payload {
    /// A plain `<slug>.ipynb` for kernels, a single CSV otherwise.
    Default,
    /// A zip archive holding the given files.
    Archive(Vec<(&'static str, &'static str)>),
    /// Loose files and directories, copied as-is.
    Raw(Vec<(&'static str, &'static str)>),
    /// A `.zip` that is not a zip.
    Corrupt,
    /// The tool succeeds but writes nothing.
    Empty,
    /// The tool exits with this code.
    ToolError(i32),
    /// The tool binary has vanished.
    ToolMissing,
}

/// In-memory stand-in for the remote platform.
#[derive(Debug, Default)]
pub struct FakeRemote {
    pub pages: Vec<Vec<RemoteItem>>,
    pub failing_page: Option<u32>,
    pub payloads: HashMap<String, Payload>,
    pub unavailable: bool,
    pub publish_code: i32,
    pub pages_requested: RefCell<Vec<u32>>,
    pub downloads: RefCell<Vec<String>>,
    pub staging_dirs: RefCell<Vec<PathBuf>>,
    pub published: RefCell<Vec<Published>>,
}

/// Snapshot of a staging area taken while publishing.
#[derive(Clone, Debug)]
pub struct Published {
    pub files: Vec<String>,
    pub manifest: serde_json::Value,
}

impl FakeRemote {
    pub fn with_pages(pages: Vec<Vec<RemoteItem>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn payload(mut self, reference: &str, payload: Payload) -> Self {
        self.payloads.insert(reference.to_string(), payload);
        self
    }

    /// True if every staging directory handed out has been removed.
    pub fn staging_cleaned_up(&self) -> bool {
        self.staging_dirs.borrow().iter().all(|dir| !dir.exists())
    }
}

impl Remote for FakeRemote {
    fn ensure_available(&self) -> Result<(), SyncError> {
        if self.unavailable {
            return Err(SyncError::RemoteToolUnavailable {
                program: "kaggle".to_string(),
            });
        }
        Ok(())
    }

    fn list_page(&self, _query: &ListQuery, page: u32) -> Result<Vec<RemoteItem>, SyncError> {
        self.pages_requested.borrow_mut().push(page);
        if self.failing_page == Some(page) {
            return Err(SyncError::ListingFailed {
                page,
                message: "401 Unauthorized".to_string(),
            });
        }
        let index = usize::try_from(page - 1).expect("page index");
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    fn download(&self, target: &FetchTarget, staging: &Path) -> Result<(), SyncError> {
        let (reference, default_file) = match target {
            FetchTarget::Kernel(kernel) => (kernel.to_string(), format!("{}.ipynb", kernel.slug)),
            FetchTarget::Dataset(dataset) => (dataset.reference(), "data.csv".to_string()),
            FetchTarget::Competition(id) => (id.clone(), "train.csv".to_string()),
        };
        self.downloads.borrow_mut().push(reference.clone());
        self.staging_dirs.borrow_mut().push(staging.to_path_buf());

        let payload = self
            .payloads
            .get(&reference)
            .cloned()
            .unwrap_or(Payload::Default);
        match payload {
            Payload::Default => {
                fs::write(staging.join(default_file), "{}").expect("write payload");
            }
            Payload::Archive(files) => write_zip(&staging.join("payload.zip"), &files),
            Payload::Raw(files) => {
                for (name, contents) in files {
                    let path = staging.join(name);
                    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
                    fs::write(path, contents).expect("write raw file");
                }
            }
            Payload::Corrupt => {
                fs::write(staging.join("payload.zip"), "not a zip").expect("write corrupt");
            }
            Payload::Empty => {}
            Payload::ToolError(code) => {
                return Err(SyncError::RemoteToolError {
                    command: format!("kaggle download {reference}"),
                    code,
                });
            }
            Payload::ToolMissing => {
                return Err(SyncError::RemoteToolUnavailable {
                    program: "kaggle".to_string(),
                });
            }
        }
        Ok(())
    }

    fn publish(&self, staging: &Path) -> Result<(), SyncError> {
        self.staging_dirs.borrow_mut().push(staging.to_path_buf());

        let mut files: Vec<String> = fs::read_dir(staging)
            .expect("read staging")
            .map(|entry| {
                entry
                    .expect("entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        files.sort();
        let manifest = fs::read_to_string(staging.join("kernel-metadata.json"))
            .map(|raw| serde_json::from_str(&raw).expect("manifest json"))
            .unwrap_or(serde_json::Value::Null);
        self.published.borrow_mut().push(Published { files, manifest });

        if self.publish_code != 0 {
            return Err(SyncError::RemoteToolError {
                command: "kaggle kernels push".to_string(),
                code: self.publish_code,
            });
        }
        Ok(())
    }
}

pub fn notebook(reference: &str) -> RemoteItem {
    notebook_with(reference, NotebookLanguage::Python, false)
}

pub fn notebook_with(reference: &str, language: NotebookLanguage, is_private: bool) -> RemoteItem {
    RemoteItem {
        reference: KernelRef::parse(reference, "").expect("kernel ref"),
        language,
        is_private,
    }
}

pub fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let file = fs::File::create(path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, contents) in files {
        writer.start_file(*name, options).expect("start file");
        writer.write_all(contents.as_bytes()).expect("write file");
    }
    writer.finish().expect("finish zip");
}
