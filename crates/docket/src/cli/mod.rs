//! Command-line front end over the pipeline.
//!
//! Configuration is resolved in this order: `--config` (or `DOCKET_CONFIG`),
//! then `<config dir>/docket/config.json` when it exists, then built-in
//! defaults. `--source`, `--sheet` and `--reference-date` override whatever
//! was loaded.

pub mod commands;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{load_config, validate_config, Config};
use crate::filter::{FilterSelection, StatusChoice};
use crate::pipeline::{Dataset, LogProgress, Pipeline, PipelineConfig};
use crate::sanitize;

/// Deadline dashboard for judicial task spreadsheets.
#[derive(Debug, Parser)]
#[command(name = "docket")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, global = true, env = "DOCKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Task spreadsheet to read.
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Sheet to read instead of the first one.
    #[arg(long, global = true)]
    pub sheet: Option<String>,

    /// Date deadlines are compared against (YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]).
    #[arg(long, global = true)]
    pub reference_date: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the dashboard figures for a filter selection.
    Summary(commands::SummaryArgs),
    /// List the most overdue tasks of the whole table.
    Top(commands::TopArgs),
    /// Write the two-sheet report workbook.
    Export(commands::ExportArgs),
    /// Produce the sector map as GeoJSON.
    Map(commands::MapArgs),
    /// List the users and sectors available for filtering.
    Filters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Filter flags shared by the commands that follow the selection.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Status to keep: all, overdue or on_time.
    #[arg(long, default_value = "all")]
    pub status: StatusChoice,

    /// Responsible user to keep; repeat for several. All users when omitted.
    #[arg(long = "user")]
    pub users: Vec<String>,

    /// Origin sector to keep; repeat for several. All sectors when omitted.
    #[arg(long = "sector")]
    pub sectors: Vec<String>,
}

impl FilterArgs {
    /// Starts from everything observed in `dataset` and narrows by the flags.
    pub fn selection(&self, dataset: &Dataset) -> FilterSelection {
        let mut selection = dataset.default_selection().with_status(self.status);
        if !self.users.is_empty() {
            selection = selection.with_users(self.users.iter().cloned());
        }
        if !self.sectors.is_empty() {
            selection = selection.with_sectors(self.sectors.iter().cloned());
        }
        selection
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docket").join("config.json"))
}

impl Cli {
    fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }
        default_config_path().filter(|path| path.is_file())
    }

    /// Loads the configuration and applies the command-line overrides.
    pub fn settings(&self) -> Result<Config> {
        let mut config = match self.config_path() {
            Some(path) => {
                log::info!("Using config {}", sanitize::redact_path(&path));
                load_config(&path).with_context(|| {
                    format!("Failed to load config from {}", path.display())
                })?
            }
            None => {
                log::debug!("No config file found, using defaults");
                Config::default()
            }
        };

        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(sheet) = &self.sheet {
            config.sheet = Some(sheet.clone());
        }
        if let Some(date) = &self.reference_date {
            config.reference_date = date.clone();
        }

        validate_config(&config).context("Invalid configuration")?;
        Ok(config)
    }

    /// Builds the pipeline and loads the source table.
    pub fn open(&self) -> Result<(Pipeline, Dataset)> {
        let config = self.settings()?;
        let pipeline = Pipeline::from_config(Arc::new(PipelineConfig::from_config(&config)?));
        let dataset = pipeline
            .load(&LogProgress)
            .with_context(|| format!("Failed to load tasks from {}", config.source))?;
        Ok((pipeline, dataset))
    }
}

/// Installs the global subscriber. `log` records are bridged into tracing.
pub fn init_tracing(json: bool) -> Result<()> {
    tracing_log::LogTracer::init().context("Failed to bridge log records")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };
    let subscriber = tracing_subscriber::registry().with(fmt_layer).with(filter);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

/// Runs the parsed command.
pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Summary(args) => commands::summary(&cli, args),
        Commands::Top(args) => commands::top(&cli, args),
        Commands::Export(args) => commands::export(&cli, args),
        Commands::Map(args) => commands::map(&cli, args),
        Commands::Filters => commands::filters(&cli),
    }
}
