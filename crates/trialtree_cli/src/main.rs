//! trialtree - browse and manage motion-capture trial trees in object storage
//!
//! The store is a local directory treated as a bucket. Every read command
//! prints the semantic type and workflow status inferred from the files in it.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use trialtree::config::{default_config_path, trialtree_home};
use trialtree::{PathStatus, TrialTreeConfig};
use trialtree_logging::{init_logging, LogConfig};

mod cli;

use cli::context::Context;

#[derive(Parser, Debug)]
#[command(name = "trialtree", version, about = "Browse and manage trial trees in object storage")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Store root directory (overrides the config file)
    #[arg(long, global = true, env = "TRIALTREE_ROOT")]
    root: Option<PathBuf>,

    /// Config file [default: ~/.trialtree/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List a folder's children with their type and status
    Ls {
        /// Folder to list (store root when omitted)
        #[arg(default_value = "")]
        path: String,

        /// Only show folders with this status (e.g. error, ready_to_process)
        #[arg(long, value_parser = parse_status)]
        status: Option<PathStatus>,
    },

    /// Show a subject: flags, results and trials
    Subject { path: String },

    /// Show a trial: marker files and segments
    Trial { path: String },

    /// Show a trial segment and its parsed results
    Segment { path: String },

    /// Print type and status for one or more paths
    Classify {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Mark a folder as a dataset
    Mkdataset { path: String },

    /// Mark a folder as a subject
    Mksubject { path: String },

    /// Create a trial under a subject and upload its files
    Mktrial {
        /// Subject folder
        subject: String,

        /// Trial name (single path segment)
        name: String,

        /// Marker file (.c3d or .trc)
        #[arg(long)]
        markers: Option<PathBuf>,

        /// Ground reaction force file (.mot)
        #[arg(long)]
        grf: Option<PathBuf>,
    },

    /// Delete a folder and everything below it
    Rm { path: String },
}

fn parse_status(s: &str) -> std::result::Result<PathStatus, String> {
    PathStatus::parse(s).ok_or_else(|| {
        let known: Vec<&str> = PathStatus::ALL.iter().map(|status| status.as_str()).collect();
        format!("unknown status '{}' (expected one of: {})", s, known.join(", "))
    })
}

fn load_config(path: Option<&PathBuf>) -> Result<TrialTreeConfig> {
    match path {
        Some(path) => TrialTreeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => TrialTreeConfig::load_or_default(&default_config_path())
            .context("Failed to load default config"),
    }
}

async fn run_command(cli: Cli, config: TrialTreeConfig) -> Result<()> {
    let ctx = Context::open(&config, cli.root, cli.json);
    match cli.command {
        Commands::Ls { path, status } => cli::browse::ls(&ctx, &path, status).await,
        Commands::Subject { path } => cli::browse::subject(&ctx, &path).await,
        Commands::Trial { path } => cli::browse::trial(&ctx, &path).await,
        Commands::Segment { path } => cli::browse::segment(&ctx, &path).await,
        Commands::Classify { paths } => cli::browse::classify(&ctx, &paths).await,
        Commands::Mkdataset { path } => cli::edit::mkdataset(&ctx, &path).await,
        Commands::Mksubject { path } => cli::edit::mksubject(&ctx, &path).await,
        Commands::Mktrial {
            subject,
            name,
            markers,
            grf,
        } => {
            cli::edit::mktrial(&ctx, &subject, &name, markers.as_deref(), grf.as_deref()).await
        }
        Commands::Rm { path } => cli::edit::rm(&ctx, &path).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(LogConfig {
        app_name: "trialtree",
        log_dir: trialtree_home().join("logs"),
        verbose: cli.verbose,
        filter: config.log_filter.as_deref(),
    }) {
        eprintln!("Warning: file logging disabled: {:#}", e);
    }
    debug!(command = ?cli.command, "starting");

    match run_command(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
