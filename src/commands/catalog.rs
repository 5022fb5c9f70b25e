use anyhow::Result;

use crate::commands::CommandReport;
use crate::logging;
use crate::store::audit;
use crate::store::catalog::{build_catalog, write_catalog};
use crate::store::paths::StorePaths;
use crate::store::util::now_epoch_secs;

pub fn run(paths: &StorePaths) -> Result<CommandReport> {
    let mut report = CommandReport::new("catalog");
    report.detail(format!("runs_dir={}", paths.runs_dir.display()));

    let built = match build_catalog(&paths.runs_dir, now_epoch_secs()?) {
        Ok(built) => built,
        Err(err) => {
            audit::record(paths, "catalog", "failed", &format!("{err:#}"));
            return Err(err);
        }
    };
    for (run, reason) in &built.skipped {
        logging::info("RUN_SKIPPED", &[("run", run.as_str()), ("reason", *reason)]);
        report.warn(format!("skipped run {run}: {reason}"));
    }

    let path = paths.catalog_path();
    write_catalog(&path, &built.catalog)?;

    let catalog = &built.catalog;
    report.detail(format!("catalog={}", path.display()));
    report.detail(format!("runs={}", catalog.runs.len()));
    report.detail(format!("latest={}", catalog.latest.run));
    report.detail(format!("latest.nodes_sha256={}", catalog.latest.nodes_sha256));
    report.detail(format!(
        "latest.positions_sha256={}",
        catalog.latest.positions_sha256
    ));
    audit::record(
        paths,
        "catalog",
        "ok",
        &format!("runs={} latest={}", catalog.runs.len(), catalog.latest.run),
    );

    Ok(report)
}
