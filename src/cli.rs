use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::error::EXIT_FAILURE;
use crate::store::config::load_config;
use crate::store::paths::resolve_paths;

#[derive(Debug, Parser)]
#[command(
    name = "memsync",
    version,
    about = "Append-only archive ingestion, partition validation, and run catalog"
)]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest one `YYYY-MM-DD_*.txt` archive into `parsed/<date>/`.
    Ingest {
        #[arg(long)]
        archive: PathBuf,
        /// Timezone label recorded in the manifest and used for `created_at`.
        #[arg(long)]
        tz: Option<String>,
        /// Tag applied to every record; repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Re-read `parsed/<date>/` and check every record's required fields.
    Validate {
        #[arg(long)]
        date: String,
        /// Also re-hash each record's source file.
        #[arg(long)]
        verify_digests: bool,
    },
    /// Rebuild `indexes/memory_catalog.json` from every complete run.
    Catalog,
    /// Re-hash the artifacts named by the catalog and report drift.
    CatalogVerify,
    /// List records indexed under a tag.
    Tags {
        #[arg(long)]
        tag: String,
    },
    /// Import a `MemoryBuild_<timestamp>` folder as a run and rebuild the catalog.
    Sync {
        memorybuild_path: PathBuf,
        /// git add/commit/push after syncing.
        #[arg(long)]
        commit: bool,
        #[arg(long)]
        branch: Option<String>,
    },
    /// Show resolved paths, configuration, and active env overrides.
    Status,
}

fn render(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for detail in &report.details {
        println!("{detail}");
    }
    for warning in &report.warnings {
        println!("[WARN] {warning}");
    }
    for issue in &report.issues {
        println!("[ERROR] {issue}");
    }
    println!("{}", if report.ok { "OK" } else { "FAIL" });
    Ok(())
}

pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    let paths = resolve_paths()?;

    let report = match cli.command {
        Command::Ingest { archive, tz, tags } => {
            let cfg = load_config(&paths)?;
            commands::ingest::run(&paths, &cfg, &commands::ingest::IngestOptions {
                archive,
                tz,
                tags,
            })?
        }
        Command::Validate {
            date,
            verify_digests,
        } => commands::validate::run(&paths, &commands::validate::ValidateCommandOptions {
            date,
            verify_digests,
        })?,
        Command::Catalog => commands::catalog::run(&paths)?,
        Command::CatalogVerify => commands::catalog_verify::run(&paths)?,
        Command::Tags { tag } => commands::tags::run(&paths, &tag)?,
        Command::Sync {
            memorybuild_path,
            commit,
            branch,
        } => commands::sync::run(&paths, &commands::sync::SyncOptions {
            source: memorybuild_path,
            commit,
            branch,
        })?,
        Command::Status => {
            let cfg = load_config(&paths)?;
            commands::status::run(&paths, &cfg)?
        }
    };

    render(&report, cli.json)?;
    Ok(if report.ok { 0 } else { EXIT_FAILURE })
}
