//! kaggle-sync: keep local datasets and notebooks in sync with a Kaggle
//! account.
//!
//! Three entry points share one engine: competition downloads (plus any
//! extra input datasets), notebook downloads, and notebook pushes. Each run
//! resolves its configuration and validates identifiers before it contacts
//! the remote service, then reconciles remote state with the local
//! filesystem so that repeated runs are safe.
//!
//! # Modules
//!
//! - [`config`]: Layered dotenv configuration and credential export
//! - [`ident`]: Dataset references, kernel references, and slugs
//! - [`remote`]: The remote service boundary and the Kaggle backend
//! - [`reconcile`]: Listing, skip/fetch decisions, and batch summaries
//! - [`transfer`]: Staged fetch and push transfers
//! - [`error`]: Error types and the batch-fatal policy

pub mod config;
pub mod error;
pub mod ident;
pub mod reconcile;
pub mod remote;
pub mod transfer;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{ConfigLayer, EffectiveConfig};
use ident::{KernelIdentity, KernelRef, TitleDecision};
use reconcile::{BatchSummary, ItemOutcome, Listing};
use remote::{FetchTarget, Kaggle, ListQuery, Remote};
use transfer::{KernelOptions, PushRequest};

pub use error::SyncError;

/// Root under which competition and dataset files land by default.
pub const DEFAULT_INPUT_ROOT: &str = "data/input";

/// The kaggle-sync CLI application.
#[derive(Parser)]
#[command(name = "kaggle-sync")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The kaggle command-line tool to invoke.
    #[arg(
        long,
        env = "KAGGLE_SYNC_BIN",
        default_value = remote::kaggle::DEFAULT_PROGRAM,
        global = true
    )]
    kaggle_bin: String,

    /// Base URL of the Kaggle REST API used for listings.
    #[arg(
        long,
        env = "KAGGLE_SYNC_API_URL",
        default_value = remote::kaggle::DEFAULT_API_URL,
        global = true
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Download competition data and any configured input datasets.
    Competition(CompetitionArgs),
    /// Download published notebooks into a local directory.
    Notebooks(NotebooksArgs),
    /// Push a local notebook to Kaggle.
    Push(PushArgs),
}

/// Config file locations shared by every subcommand.
#[derive(clap::Args, Clone, Debug)]
pub struct ConfigArgs {
    /// Path to the config file that stores general Kaggle settings.
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Path to the file that stores private Kaggle credentials.
    #[arg(long, default_value = config::DEFAULT_SECRETS_PATH)]
    pub secrets: PathBuf,
}

/// Arguments for the competition subcommand.
#[derive(clap::Args, Clone, Debug)]
pub struct CompetitionArgs {
    #[command(flatten)]
    pub files: ConfigArgs,

    /// Override destination directory. Defaults to DOWNLOAD_DIR, then
    /// data/input/<competition>.
    #[arg(long)]
    pub destination: Option<PathBuf>,

    /// Re-download input datasets whose destination already holds files.
    #[arg(long)]
    pub overwrite: bool,
}

/// Arguments for the notebooks subcommand.
#[derive(clap::Args, Clone, Debug)]
pub struct NotebooksArgs {
    #[command(flatten)]
    pub files: ConfigArgs,

    /// Directory to store downloaded notebooks.
    #[arg(long, default_value = "dev")]
    pub destination: PathBuf,

    /// Account to pull notebooks for. Defaults to NOTEBOOK_OWNER, then
    /// ACCOUNT_NAME.
    #[arg(long)]
    pub owner: Option<String>,

    /// Download only this notebook (<owner>/<slug> or <slug>).
    #[arg(long)]
    pub kernel: Option<String>,

    /// Include private notebooks owned by the authenticated account.
    #[arg(long)]
    pub include_private: bool,

    /// Overwrite existing notebooks instead of skipping them.
    #[arg(long)]
    pub overwrite: bool,

    /// Number of notebooks to fetch per API page.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: u32,
}

/// Arguments for the push subcommand.
#[derive(clap::Args, Clone, Debug)]
pub struct PushArgs {
    #[command(flatten)]
    pub files: ConfigArgs,

    /// Path to the notebook to push.
    #[arg(long)]
    pub notebook: PathBuf,

    /// Kernel slug (lowercase letters, numbers, dashes).
    #[arg(long)]
    pub slug: String,

    /// Kernel title; defaults to the notebook name.
    #[arg(long)]
    pub title: Option<String>,

    /// Competition to attach. Defaults to COMPETITION_ID when set.
    #[arg(long)]
    pub competition: Option<String>,

    /// Dataset to attach as a kernel input (<owner>/<dataset>); repeatable.
    #[arg(long = "dataset-source")]
    pub dataset_sources: Vec<String>,

    /// Enable GPU for the kernel.
    #[arg(long)]
    pub enable_gpu: bool,

    /// Enable internet access for the kernel.
    #[arg(long)]
    pub enable_internet: bool,

    /// Mark the kernel as private.
    #[arg(long)]
    pub private: bool,
}

/// Run the kaggle-sync CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), SyncError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let remote_for = |config: &EffectiveConfig| {
        Kaggle::new(config)
            .with_program(cli.kaggle_bin.clone())
            .with_api_url(cli.api_url.clone())
    };

    match &cli.command {
        Commands::Competition(args) => {
            let config = config::resolve(
                &ConfigLayer::required(&args.files.config),
                &ConfigLayer::optional(&args.files.secrets),
                config::COMPETITION_KEYS,
            )?;
            run_competition(args, &config, &remote_for(&config))
        }
        Commands::Notebooks(args) => {
            let config = config::resolve(
                &ConfigLayer::required(&args.files.config),
                &ConfigLayer::optional(&args.files.secrets),
                config::CREDENTIAL_KEYS,
            )?;
            run_notebooks(args, &config, &remote_for(&config))
        }
        Commands::Push(args) => {
            let config = config::resolve(
                &ConfigLayer::optional(&args.files.config),
                &ConfigLayer::required(&args.files.secrets),
                config::CREDENTIAL_KEYS,
            )?;
            run_push(args, &config, &remote_for(&config))
        }
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute the competition subcommand against `remote`.
///
/// The competition download itself is all-or-nothing. Input datasets that
/// follow it are downloaded one by one; a failing dataset is reported and
/// the rest still run.
pub fn run_competition(
    args: &CompetitionArgs,
    config: &EffectiveConfig,
    remote: &dyn Remote,
) -> Result<(), SyncError> {
    let competition = config.require(config::COMPETITION_ID).to_string();
    let datasets = match config.get_non_empty(config::INPUT_DATASETS) {
        Some(raw) => ident::parse_dataset_refs(raw)?,
        None => Vec::new(),
    };
    let destination = args
        .destination
        .clone()
        .or_else(|| config.get_non_empty(config::DOWNLOAD_DIR).map(PathBuf::from))
        .unwrap_or_else(|| Path::new(DEFAULT_INPUT_ROOT).join(&competition));

    config::export_credentials(config);
    remote.ensure_available()?;

    let report = transfer::fetch(
        remote,
        &FetchTarget::Competition(competition.clone()),
        &destination,
    )?;
    for archive in &report.archives {
        println!("Extracted {archive}");
    }

    if !datasets.is_empty() {
        let summary = reconcile::sync_datasets(
            remote,
            &datasets,
            Path::new(DEFAULT_INPUT_ROOT),
            args.overwrite,
            print_outcome,
        )?;
        print!("{summary}");
        if !summary.is_success() {
            return Err(SyncError::BatchFailed { summary });
        }
    }

    println!(
        "Download complete. Files are saved under {}",
        destination.display()
    );
    Ok(())
}

/// Execute the notebooks subcommand against `remote`.
pub fn run_notebooks(
    args: &NotebooksArgs,
    config: &EffectiveConfig,
    remote: &dyn Remote,
) -> Result<(), SyncError> {
    let owner = args
        .owner
        .clone()
        .or_else(|| config.get_non_empty(config::NOTEBOOK_OWNER).map(str::to_string))
        .unwrap_or_else(|| config.account_name().to_string());
    let single = args
        .kernel
        .as_deref()
        .map(|kernel| KernelRef::parse(kernel, &owner))
        .transpose()?;

    config::export_credentials(config);
    remote.ensure_available()?;
    fs::create_dir_all(&args.destination)?;

    let summary = match &single {
        Some(kernel) => reconcile::sync_single_notebook(
            remote,
            kernel,
            &args.destination,
            args.overwrite,
            print_outcome,
        )?,
        None => {
            println!(
                "Downloading notebooks of '{}' to {} ...",
                owner,
                args.destination.display()
            );
            let listing = Listing::new(
                remote,
                ListQuery {
                    owner: owner.clone(),
                    caller: config.account_name().to_string(),
                    include_private: args.include_private,
                    page_size: args.page_size,
                },
            );
            reconcile::sync_notebooks(
                remote,
                listing,
                &args.destination,
                args.overwrite,
                print_outcome,
            )?
        }
    };

    if summary.total() == 0 {
        println!("No notebooks found for owner '{owner}'.");
        return Ok(());
    }
    finish_batch(summary)
}

/// Execute the push subcommand against `remote`.
pub fn run_push(
    args: &PushArgs,
    config: &EffectiveConfig,
    remote: &dyn Remote,
) -> Result<(), SyncError> {
    if !args.notebook.is_file() {
        return Err(SyncError::NotebookNotFound {
            path: args.notebook.clone(),
        });
    }

    let title = args
        .title
        .clone()
        .unwrap_or_else(|| ident::default_title(&args.notebook));
    let (identity, decision) = KernelIdentity::new(config.account_name(), &args.slug, &title)?;
    if let TitleDecision::Replaced { original, title } = &decision {
        tracing::info!(%original, %title, "kernel title replaced");
        eprintln!(
            "[INFO] Adjusted kernel title to '{}' so that it matches slug '{}'.",
            title, identity.slug
        );
    }

    let dataset_sources = args
        .dataset_sources
        .iter()
        .map(|raw| ident::parse_dataset_refs(raw))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .map(|dataset| dataset.reference())
        .collect();

    let request = PushRequest {
        identity,
        notebook: args.notebook.clone(),
        options: KernelOptions {
            is_private: args.private,
            enable_gpu: args.enable_gpu,
            enable_internet: args.enable_internet,
        },
        competition: args
            .competition
            .clone()
            .or_else(|| config.get_non_empty(config::COMPETITION_ID).map(str::to_string)),
        dataset_sources,
    };

    config::export_credentials(config);
    remote.ensure_available()?;

    println!("Pushing kernel {} ...", request.identity.reference());
    let report = transfer::push(remote, &request)?;
    println!("Kernel push complete. Track execution at {}", report.url);
    Ok(())
}

fn print_outcome(outcome: &ItemOutcome) {
    println!("{outcome}");
}

fn finish_batch(summary: BatchSummary) -> Result<(), SyncError> {
    print!("{summary}");
    if summary.is_success() {
        Ok(())
    } else {
        Err(SyncError::BatchFailed { summary })
    }
}
