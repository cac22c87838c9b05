//! Subcommand arguments and handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::export::REPORT_MIME_TYPE;
use crate::filter::{distinct_sectors, distinct_users};
use crate::pipeline::LogProgress;
use crate::report::{top_n_overdue, OverdueRow};

use super::{render, Cli, FilterArgs, OutputFormat};

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    /// Number of tasks to list. Defaults to the configured `top_n`.
    #[arg(short = 'n', long = "count")]
    pub n: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Workbook to write. Defaults to the configured export path.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// GeoJSON file to write. Printed to stdout when omitted.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn summary(cli: &Cli, args: &SummaryArgs) -> Result<()> {
    let (pipeline, dataset) = cli.open()?;
    let selection = args.filter.selection(&dataset);
    let report = pipeline.report(&dataset, &selection, &LogProgress);

    match cli.format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print!("{}", render::summary(&report));
            Ok(())
        }
    }
}

pub fn top(cli: &Cli, args: &TopArgs) -> Result<()> {
    let (pipeline, dataset) = cli.open()?;
    let n = args.n.unwrap_or(pipeline.config().top_n);
    let rows: Vec<OverdueRow> = top_n_overdue(&dataset.tasks, n)
        .into_iter()
        .map(OverdueRow::from_task)
        .collect();

    match cli.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            print!("{}", render::overdue_rows(&rows));
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
struct Written {
    path: PathBuf,
    content_type: &'static str,
    rows: usize,
}

impl Written {
    fn report(path: PathBuf, rows: usize) -> Self {
        Self {
            path,
            content_type: REPORT_MIME_TYPE,
            rows,
        }
    }
}

pub fn export(cli: &Cli, args: &ExportArgs) -> Result<()> {
    let (pipeline, dataset) = cli.open()?;
    let selection = args.filter.selection(&dataset);
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&pipeline.config().export.path));

    let written = pipeline
        .export(&dataset, &selection, &path, &LogProgress)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    let rows = dataset.filter(&selection).len();

    match cli.format {
        OutputFormat::Json => print_json(&Written::report(written, rows)),
        OutputFormat::Text => {
            println!("Report written to {} ({} filtered rows)", written.display(), rows);
            Ok(())
        }
    }
}

pub fn map(cli: &Cli, args: &MapArgs) -> Result<()> {
    let (pipeline, dataset) = cli.open()?;
    let selection = args.filter.selection(&dataset);

    match &args.output {
        Some(path) => {
            let written = pipeline
                .export_map(&dataset, &selection, path)
                .with_context(|| format!("Failed to write map to {}", path.display()))?;
            println!("Map written to {}", written.display());
            Ok(())
        }
        None => print_json(&pipeline.map(&dataset, &selection)),
    }
}

#[derive(Debug, Serialize)]
struct FilterOptions {
    statuses: Vec<&'static str>,
    users: Vec<String>,
    sectors: Vec<String>,
}

pub fn filters(cli: &Cli) -> Result<()> {
    let (_, dataset) = cli.open()?;
    let options = FilterOptions {
        statuses: vec!["all", "overdue", "on_time"],
        users: distinct_users(&dataset.tasks).into_iter().collect(),
        sectors: distinct_sectors(&dataset.tasks).into_iter().collect(),
    };

    match cli.format {
        OutputFormat::Json => print_json(&options),
        OutputFormat::Text => {
            println!("Status: {}", options.statuses.join(", "));
            println!("Users ({}):", options.users.len());
            for user in &options.users {
                println!("  {}", user);
            }
            println!("Sectors ({}):", options.sectors.len());
            for sector in &options.sectors {
                println!("  {}", sector);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_report_carries_content_type() {
        let written = Written::report(PathBuf::from("relatorio_tarefas.xlsx"), 12);
        let value = serde_json::to_value(&written).unwrap();

        assert_eq!(value["path"], "relatorio_tarefas.xlsx");
        assert_eq!(
            value["content_type"],
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(value["rows"], 12);
    }
}
