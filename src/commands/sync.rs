use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::store::paths::StorePaths;
use crate::store::sync::{SyncRequest, sync_run};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub source: PathBuf,
    pub commit: bool,
    pub branch: Option<String>,
}

pub fn run(paths: &StorePaths, opts: &SyncOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("sync");

    let out = sync_run(
        paths,
        &SyncRequest {
            source: opts.source.clone(),
            commit: opts.commit,
            branch: opts.branch.clone(),
        },
    )?;

    report.detail(format!("run={}", out.run_name));
    report.detail(format!("run_dir={}", out.run_dir.display()));
    report.detail(format!("copied={}", out.copied.join(",")));
    report.detail(format!("files_copied={}", out.files_copied));
    for sub in &out.missing {
        report.warn(format!("Missing {sub} in {}", opts.source.display()));
    }
    for (run, reason) in &out.catalog.skipped {
        report.warn(format!("skipped run {run}: {reason}"));
    }
    report.detail(format!("catalog={}", out.catalog_path.display()));
    report.detail(format!("latest={}", out.catalog.catalog.latest.run));
    report.detail(format!("committed={}", out.committed));
    if let Some(err) = out.push_error {
        report.warn(format!("git push failed; check remote/branch auth: {err}"));
    }

    Ok(report)
}
