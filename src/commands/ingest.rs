use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::store::config::MemsyncConfig;
use crate::store::ingest::{IngestRequest, ingest_archive};
use crate::store::paths::StorePaths;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub archive: PathBuf,
    pub tz: Option<String>,
    pub tags: Vec<String>,
}

pub fn run(paths: &StorePaths, cfg: &MemsyncConfig, opts: &IngestOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("ingest");

    let out = ingest_archive(
        paths,
        cfg,
        &IngestRequest {
            archive: opts.archive.clone(),
            tz: opts.tz.clone(),
            tags: opts.tags.clone(),
        },
    )?;

    report.detail(format!("archive={}", opts.archive.display()));
    report.detail(format!("date={}", out.date));
    report.detail(format!("splitter={}", out.parser));
    report.detail(format!("tz={}", out.tz));
    report.detail(format!("created_at={}", out.created_at));
    report.detail(format!("line_count={}", out.line_count));
    report.detail(format!("node_count={}", out.partition.node_count));
    report.detail(format!("partition={}", out.partition.partition_dir.display()));
    if out.tags_appended > 0 {
        report.detail(format!(
            "tag_index={} appended={}",
            out.tag_index_path.display(),
            out.tags_appended
        ));
    } else {
        report.detail("tag_index=unchanged (no tagged records)");
    }

    Ok(report)
}
