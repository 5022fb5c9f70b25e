use anyhow::Result;

use crate::commands::CommandReport;
use crate::store::paths::StorePaths;
use crate::store::tag_index;

pub fn run(paths: &StorePaths, tag: &str) -> Result<CommandReport> {
    let mut report = CommandReport::new("tags");
    let index = paths.tag_index_path();

    let entries = tag_index::lookup(&index, tag)?;
    report.detail(format!("tag_index={}", index.display()));
    report.detail(format!("tag={} matches={}", tag.trim(), entries.len()));
    for entry in entries {
        report.detail(format!("node_id={} date={}", entry.node_id, entry.date));
    }

    Ok(report)
}
