use anyhow::Result;

use crate::commands::CommandReport;
use crate::store::audit;
use crate::store::ingest::parse_partition_date;
use crate::store::paths::StorePaths;
use crate::store::validate::{ValidateOptions, validate_partition};

#[derive(Debug, Clone)]
pub struct ValidateCommandOptions {
    pub date: String,
    pub verify_digests: bool,
}

pub fn run(paths: &StorePaths, opts: &ValidateCommandOptions) -> Result<CommandReport> {
    let date = parse_partition_date(&opts.date)?;
    let partition_dir = paths.partition_dir(&date.format("%Y-%m-%d").to_string());
    let mut report = CommandReport::new("validate");

    let out = validate_partition(
        &partition_dir,
        &ValidateOptions {
            verify_digests: opts.verify_digests,
            source_root: Some(paths.root.clone()),
        },
    )?;

    report.detail(format!("partition={}", out.partition_dir));
    report.detail(format!("lines_checked={}", out.lines_checked));
    for missing in &out.missing_files {
        report.warn(format!("Missing {missing}"));
    }
    for issue in &out.issues {
        report.issue(issue.to_string());
    }
    audit::record(
        paths,
        "validate",
        if out.ok() { "ok" } else { "failed" },
        &format!("{} issues={}", out.partition_dir, out.issues.len()),
    );

    Ok(report)
}
