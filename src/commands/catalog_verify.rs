use anyhow::Result;

use crate::commands::CommandReport;
use crate::store::audit;
use crate::store::catalog::{read_catalog, verify_catalog};
use crate::store::paths::StorePaths;

pub fn run(paths: &StorePaths) -> Result<CommandReport> {
    let mut report = CommandReport::new("catalog-verify");
    let path = paths.catalog_path();
    report.detail(format!("catalog={}", path.display()));

    if !path.exists() {
        report.issue("catalog missing; run `memsync catalog` first");
        return Ok(report);
    }

    let catalog = read_catalog(&path)?;
    let verification = verify_catalog(&catalog);
    report.detail(format!("runs={}", catalog.runs.len()));
    report.detail(format!("latest={}", catalog.latest.run));
    report.detail(format!("files_checked={}", verification.files_checked));
    audit::record(
        paths,
        "catalog-verify",
        if verification.ok() { "ok" } else { "drift" },
        &format!("files={} issues={}", verification.files_checked, verification.issues.len()),
    );
    for issue in verification.issues {
        report.issue(issue);
    }

    Ok(report)
}
