// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]

//! Mietbot CLI - automated applications for a paginated housing catalog.
//!
//! # Examples
//!
//! ```bash
//! # Continuous crawl with the file ledger and local profile
//! mietbot
//!
//! # One pass, visible browser, fill forms but never submit
//! mietbot --run-once --headless false --dry-run
//!
//! # Remote ledger (redundant with the local file ledger)
//! mietbot --ledger-backend remote --project-id my-project \
//!         --credentials ~/.config/mietbot/remote.json
//!
//! # Remote profile
//! mietbot --config-source remote --profile-key anna@example.com
//!
//! # Seed the remote profile collection from the local profile file
//! mietbot upload-profile --key anna@example.com
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use mietbot_core::{AppConfig, ConfigError, ProfileError, UserProfile};
use mietbot_crawler::{run_session, CrawlerError};
use mietbot_notify::Notifier;
use mietbot_store::{
    build_config_store, build_ledger, ConfigStore, RemoteConfigStore, RemoteDocStore, StoreError,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Automated rental applications for the housing catalog.
#[derive(Parser)]
#[command(name = "mietbot")]
#[command(about = "Automated rental applications for a paginated housing catalog")]
#[command(version)]
#[command(author = "Mietbot Contributors")]
struct Cli {
    /// Subcommand to run. If none, runs the crawl loop.
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (defaults to the XDG config location).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Idle refresh interval in minutes when no listings are found.
    #[arg(long, value_name = "MINUTES")]
    refresh_interval: Option<u64>,

    /// Run the browser headless.
    #[arg(long, value_name = "BOOL")]
    headless: Option<bool>,

    /// Crawl one pass and exit.
    #[arg(long)]
    run_once: bool,

    /// Exit once pagination reports the last page.
    #[arg(long, value_name = "BOOL")]
    exit_on_last_page: Option<bool>,

    /// Wait after a successful application ("30s", "5m", "1h"; bare
    /// number = seconds).
    #[arg(long, value_name = "DELAY")]
    application_delay: Option<String>,

    /// Fill application forms but never submit them.
    #[arg(long)]
    dry_run: bool,

    /// Directory for debug page snapshots (HTML + screenshots).
    #[arg(long, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,

    /// Application ledger backend ("file" or "remote").
    #[arg(long, value_name = "BACKEND")]
    ledger_backend: Option<String>,

    /// File ledger path.
    #[arg(long, value_name = "PATH")]
    ledger_path: Option<PathBuf>,

    /// Remote store project id.
    #[arg(long, value_name = "ID", global = true)]
    project_id: Option<String>,

    /// Remote ledger collection.
    #[arg(long, value_name = "NAME", global = true)]
    collection: Option<String>,

    /// Remote credential file (JSON with a bearer token).
    #[arg(long, value_name = "PATH", global = true)]
    credentials: Option<PathBuf>,

    /// Remote database id.
    #[arg(long, value_name = "ID", global = true)]
    database: Option<String>,

    /// Profile source ("file" or "remote").
    #[arg(long, value_name = "SOURCE")]
    config_source: Option<String>,

    /// Remote profile document key.
    #[arg(long, value_name = "KEY", global = true)]
    profile_key: Option<String>,

    /// Profile file path.
    #[arg(long, value_name = "PATH", global = true)]
    profile: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Upload the local profile file into the remote profile collection.
    UploadProfile(UploadProfileArgs),
}

/// Arguments for upload-profile.
#[derive(clap::Args)]
struct UploadProfileArgs {
    /// Document key to store the profile under. Defaults to the profile's
    /// user id, then its notification email, then its first recipient.
    #[arg(long, value_name = "KEY")]
    key: Option<String>,
}

/// CLI exit codes.
#[repr(i32)]
enum ExitCode {
    /// General error.
    Error = 1,
    /// Unrecoverable configuration error.
    ConfigError = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("mietbot=debug,info")
        } else {
            EnvFilter::new("mietbot=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    config.apply_env_overrides();
    apply_cli_overrides(&mut config, cli);

    match &cli.command {
        Some(Commands::UploadProfile(args)) => upload_profile(&config, args).await,
        None => run_bot(&config).await,
    }
}

/// Explicit CLI flags win over both the config file and the environment.
fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(minutes) = cli.refresh_interval {
        config.crawler.refresh_interval_minutes = minutes;
    }
    if let Some(headless) = cli.headless {
        config.browser.headless = headless;
    }
    if cli.run_once {
        config.crawler.run_once = true;
    }
    if let Some(exit) = cli.exit_on_last_page {
        config.crawler.exit_on_last_page = exit;
    }
    if let Some(delay) = &cli.application_delay {
        config.crawler.application_delay = delay.clone();
    }
    if cli.dry_run {
        config.crawler.dry_run = true;
    }
    if let Some(dir) = &cli.snapshot_dir {
        config.browser.snapshot_dir = Some(dir.clone());
    }
    if let Some(backend) = &cli.ledger_backend {
        config.store.ledger_backend = backend.clone();
    }
    if let Some(path) = &cli.ledger_path {
        config.store.ledger_path = Some(path.clone());
    }
    if let Some(id) = &cli.project_id {
        config.remote.project_id = Some(id.clone());
    }
    if let Some(name) = &cli.collection {
        config.remote.collection = name.clone();
    }
    if let Some(path) = &cli.credentials {
        config.remote.credentials_path = Some(path.clone());
    }
    if let Some(db) = &cli.database {
        config.remote.database = db.clone();
    }
    if let Some(source) = &cli.config_source {
        config.store.profile_source = source.clone();
    }
    if let Some(key) = &cli.profile_key {
        config.store.profile_key = Some(key.clone());
    }
    if let Some(path) = &cli.profile {
        config.store.profile_path = Some(path.clone());
    }
}

/// Wire profile, ledger and notifier, then hand off to the session runner.
async fn run_bot(config: &AppConfig) -> Result<()> {
    if config.store.profile_source == "remote"
        && config
            .store
            .profile_key
            .as_deref()
            .map_or(true, |key| key.trim().is_empty())
    {
        return Err(StoreError::MissingParameter {
            field: "store.profile_key",
        }
        .into());
    }

    let profiles = build_config_store(config)?;
    profiles.initialize().await?;
    let key = config.store.profile_key.clone().unwrap_or_default();
    let profile = profiles.load_profile(&key).await?;
    profile.validate()?;
    tracing::info!(
        source = profiles.name(),
        recipients = profile.emails.len(),
        "profile loaded"
    );

    let ledger = build_ledger(config)?;
    ledger.initialize().await?;
    tracing::info!(backend = ledger.name(), "application ledger ready");

    let notifier = Notifier::from_config(&config.notify, profile.notification_email.as_deref());
    if notifier.is_none() {
        tracing::debug!("notifications disabled, SMTP or notification address not configured");
    }

    run_session(config, &profile, ledger.as_ref(), notifier.as_ref()).await?;
    Ok(())
}

/// Push the local profile file into the remote profile collection.
async fn upload_profile(config: &AppConfig, args: &UploadProfileArgs) -> Result<()> {
    let path = match &config.store.profile_path {
        Some(path) => path.clone(),
        None => AppConfig::config_path()?.with_file_name("profile.json"),
    };
    let profile = UserProfile::load_from_file(&path)?;
    profile.validate()?;

    let key = args
        .key
        .clone()
        .or_else(|| profile.resolve_key())
        .ok_or(StoreError::MissingParameter {
            field: "profile key",
        })?;

    let store = RemoteConfigStore::new(
        RemoteDocStore::from_config(&config.remote)?,
        config.remote.profile_collection.clone(),
    );
    store.initialize().await?;
    store.save_profile(&key, &profile).await?;

    println!(
        "Profile uploaded as {key:?} to collection {:?}",
        config.remote.profile_collection
    );
    Ok(())
}

/// Map an error to the documented process exit code.
fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<ProfileError>().is_some() {
        return ExitCode::ConfigError as i32;
    }
    if let Some(store) = err.downcast_ref::<StoreError>() {
        return store_exit_code(store);
    }
    if let Some(CrawlerError::Store(store)) = err.downcast_ref::<CrawlerError>() {
        return store_exit_code(store);
    }
    ExitCode::Error as i32
}

fn store_exit_code(err: &StoreError) -> i32 {
    match err {
        StoreError::MissingParameter { .. }
        | StoreError::InvalidConfig { .. }
        | StoreError::Credentials { .. }
        | StoreError::NotFound { .. }
        | StoreError::Profile(_) => ExitCode::ConfigError as i32,
        _ => ExitCode::Error as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::parse_from([
            "mietbot",
            "--run-once",
            "--dry-run",
            "--headless",
            "false",
            "--refresh-interval",
            "7",
            "--ledger-backend",
            "remote",
            "--project-id",
            "my-project",
            "--application-delay",
            "5m",
        ]);

        let mut config = AppConfig::default();
        apply_cli_overrides(&mut config, &cli);

        assert!(config.crawler.run_once);
        assert!(config.crawler.dry_run);
        assert!(!config.browser.headless);
        assert_eq!(config.crawler.refresh_interval_minutes, 7);
        assert_eq!(config.store.ledger_backend, "remote");
        assert_eq!(config.remote.project_id.as_deref(), Some("my-project"));
        assert_eq!(config.crawler.application_delay, "5m");
    }

    #[test]
    fn test_absent_flags_leave_config_alone() {
        let cli = Cli::parse_from(["mietbot"]);
        let mut config = AppConfig::default();
        apply_cli_overrides(&mut config, &cli);

        assert!(!config.crawler.run_once);
        assert!(config.browser.headless);
        assert_eq!(config.store.ledger_backend, "file");
    }

    #[test]
    fn test_missing_remote_parameter_exits_with_config_code() {
        let err: anyhow::Error = StoreError::MissingParameter {
            field: "remote.project_id",
        }
        .into();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_generic_store_failure_exits_with_error_code() {
        let err: anyhow::Error = StoreError::Remote {
            status: 503,
            operation: "get document".to_string(),
            message: "unavailable".to_string(),
        }
        .into();
        assert_eq!(exit_code(&err), 1);
    }
}
