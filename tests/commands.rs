use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use kaggle_sync::config::{self, EffectiveConfig};
use kaggle_sync::remote::NotebookLanguage;
use kaggle_sync::{
    run_competition, run_notebooks, run_push, CompetitionArgs, ConfigArgs, NotebooksArgs,
    PushArgs, SyncError,
};

mod common;

use common::{notebook, FakeRemote, Payload};

fn effective(pairs: &[(&str, &str)], required: &[&str]) -> EffectiveConfig {
    let base: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    EffectiveConfig::from_layers(base, BTreeMap::new(), required).expect("config")
}

fn files() -> ConfigArgs {
    ConfigArgs {
        config: PathBuf::from(config::DEFAULT_CONFIG_PATH),
        secrets: PathBuf::from(config::DEFAULT_SECRETS_PATH),
    }
}

#[test]
fn competition_then_datasets() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let cats = temp.path().join("cats");
    let datasets = format!("alice/cats:{}", cats.display());
    let config = effective(
        &[
            ("ACCOUNT_NAME", "alice"),
            ("ACCOUNT_KEY", "key"),
            ("COMPETITION_ID", "titanic"),
            ("INPUT_DATASETS", datasets.as_str()),
        ],
        config::COMPETITION_KEYS,
    );
    let remote = FakeRemote::default()
        .payload("titanic", Payload::Archive(vec![("train.csv", "id\n")]))
        .payload("alice/cats", Payload::Archive(vec![("cats.csv", "id\n")]));
    let args = CompetitionArgs {
        files: files(),
        destination: Some(temp.path().join("titanic")),
        overwrite: false,
    };

    run_competition(&args, &config, &remote).expect("run");

    assert!(temp.path().join("titanic/train.csv").is_file());
    assert!(cats.join("cats.csv").is_file());
    assert_eq!(
        *remote.downloads.borrow(),
        vec!["titanic".to_string(), "alice/cats".to_string()]
    );
}

#[test]
fn competition_failure_aborts_before_datasets() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = effective(
        &[
            ("ACCOUNT_NAME", "alice"),
            ("ACCOUNT_KEY", "key"),
            ("COMPETITION_ID", "titanic"),
            ("INPUT_DATASETS", "alice/cats"),
        ],
        config::COMPETITION_KEYS,
    );
    let remote = FakeRemote::default().payload("titanic", Payload::ToolError(403));
    let args = CompetitionArgs {
        files: files(),
        destination: Some(temp.path().to_path_buf()),
        overwrite: false,
    };

    let err = run_competition(&args, &config, &remote).expect_err("abort");

    assert!(matches!(err, SyncError::RemoteToolError { code: 403, .. }));
    assert_eq!(*remote.downloads.borrow(), vec!["titanic".to_string()]);
}

#[test]
fn invalid_dataset_list_fails_before_any_remote_call() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = effective(
        &[
            ("ACCOUNT_NAME", "alice"),
            ("ACCOUNT_KEY", "key"),
            ("COMPETITION_ID", "titanic"),
            ("INPUT_DATASETS", "alice/cats, no-slash-here"),
        ],
        config::COMPETITION_KEYS,
    );
    let remote = FakeRemote {
        unavailable: true,
        ..FakeRemote::default()
    };
    let args = CompetitionArgs {
        files: files(),
        destination: Some(temp.path().to_path_buf()),
        overwrite: false,
    };

    let err = run_competition(&args, &config, &remote).expect_err("invalid");

    assert!(matches!(err, SyncError::InvalidReference { .. }));
    assert!(remote.downloads.borrow().is_empty());
}

#[test]
fn notebooks_batch_with_a_failure_reports_batch_failed() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = effective(
        &[("ACCOUNT_NAME", "alice"), ("ACCOUNT_KEY", "key")],
        config::CREDENTIAL_KEYS,
    );
    let remote = FakeRemote::with_pages(vec![vec![notebook("alice/one"), notebook("alice/two")]])
        .payload("alice/one", Payload::Corrupt);
    let args = NotebooksArgs {
        files: files(),
        destination: temp.path().to_path_buf(),
        owner: None,
        kernel: None,
        include_private: false,
        overwrite: false,
        page_size: 50,
    };

    let err = run_notebooks(&args, &config, &remote).expect_err("batch failed");

    match err {
        SyncError::BatchFailed { summary } => {
            assert_eq!(summary.fetched, 1);
            assert_eq!(summary.failed, vec!["alice/one".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(temp.path().join("two.ipynb").is_file());
}

#[test]
fn missing_tool_fails_fast() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = effective(
        &[("ACCOUNT_NAME", "alice"), ("ACCOUNT_KEY", "key")],
        config::CREDENTIAL_KEYS,
    );
    let remote = FakeRemote {
        unavailable: true,
        ..FakeRemote::with_pages(vec![vec![notebook("alice/one")]])
    };
    let args = NotebooksArgs {
        files: files(),
        destination: temp.path().to_path_buf(),
        owner: Some("alice".to_string()),
        kernel: None,
        include_private: false,
        overwrite: false,
        page_size: 50,
    };

    let err = run_notebooks(&args, &config, &remote).expect_err("unavailable");

    assert!(matches!(err, SyncError::RemoteToolUnavailable { .. }));
    assert!(remote.pages_requested.borrow().is_empty());
}

#[test]
fn push_rejects_bad_slug_before_contacting_remote() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let notebook = temp.path().join("titanic.ipynb");
    fs::write(&notebook, "{}").expect("write notebook");
    let config = effective(
        &[("ACCOUNT_NAME", "alice"), ("ACCOUNT_KEY", "key")],
        config::CREDENTIAL_KEYS,
    );
    let remote = FakeRemote::default();
    let args = PushArgs {
        files: files(),
        notebook,
        slug: "Titanic Baseline".to_string(),
        title: None,
        competition: None,
        dataset_sources: Vec::new(),
        enable_gpu: false,
        enable_internet: false,
        private: false,
    };

    let err = run_push(&args, &config, &remote).expect_err("invalid slug");

    match err {
        SyncError::InvalidSlug { suggestion, .. } => assert_eq!(suggestion, "titanic-baseline"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(remote.published.borrow().is_empty());
}

#[test]
fn push_falls_back_to_configured_competition_and_slug_title() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let notebook = temp.path().join("scratch.ipynb");
    fs::write(&notebook, "{}").expect("write notebook");
    let config = effective(
        &[
            ("ACCOUNT_NAME", "alice"),
            ("ACCOUNT_KEY", "key"),
            ("COMPETITION_ID", "titanic"),
        ],
        config::CREDENTIAL_KEYS,
    );
    let remote = FakeRemote::default();
    let args = PushArgs {
        files: files(),
        notebook,
        slug: "titanic-baseline".to_string(),
        title: None,
        competition: None,
        dataset_sources: vec!["bob/extra-data".to_string()],
        enable_gpu: true,
        enable_internet: false,
        private: false,
    };

    run_push(&args, &config, &remote).expect("push");

    let published = remote.published.borrow();
    let manifest = &published[0].manifest;
    assert_eq!(manifest["title"], "Titanic Baseline");
    assert_eq!(manifest["competition_sources"], serde_json::json!(["titanic"]));
    assert_eq!(manifest["dataset_sources"], serde_json::json!(["bob/extra-data"]));
    assert_eq!(manifest["enable_gpu"], true);
}

#[test]
fn private_listing_keeps_the_account_notebooks_under_another_owner() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = effective(
        &[
            ("ACCOUNT_NAME", "alice"),
            ("ACCOUNT_KEY", "key"),
            ("NOTEBOOK_OWNER", "team"),
        ],
        config::CREDENTIAL_KEYS,
    );
    let remote = FakeRemote::with_pages(vec![vec![
        common::notebook_with("alice/secret", NotebookLanguage::Python, true),
        common::notebook_with("team/hidden", NotebookLanguage::Python, true),
    ]]);
    let args = NotebooksArgs {
        files: files(),
        destination: temp.path().to_path_buf(),
        owner: None,
        kernel: None,
        include_private: true,
        overwrite: false,
        page_size: 50,
    };

    run_notebooks(&args, &config, &remote).expect("run");

    assert!(temp.path().join("secret.ipynb").is_file());
    assert!(!temp.path().join("hidden.ipynb").exists());
}
