use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::logging::LOG_ENV;
use crate::store::config::{CONFIG_ENV_KEYS, MemsyncConfig};
use crate::store::paths::{PATH_ENV_KEYS, StorePaths};

const LOGGING_ENV_KEYS: &[&str] = &[LOG_ENV];

/// Every environment key the binary reads at runtime.
pub fn env_keys() -> impl Iterator<Item = &'static str> {
    PATH_ENV_KEYS
        .iter()
        .chain(CONFIG_ENV_KEYS.iter())
        .chain(LOGGING_ENV_KEYS.iter())
        .copied()
}

/// Env keys the binary reads that are currently set to a non-blank value.
pub fn active_env_overrides() -> Vec<(&'static str, String)> {
    env_keys()
        .filter_map(|key| match env::var(key) {
            Ok(v) if !v.trim().is_empty() => Some((key, v.trim().to_string())),
            _ => None,
        })
        .collect()
}

pub fn run(paths: &StorePaths, cfg: &MemsyncConfig) -> Result<CommandReport> {
    let mut report = CommandReport::new("status");

    report.detail(format!("version={}", env!("CARGO_PKG_VERSION")));
    report.detail(format!("build={}", env!("MEMSYNC_BUILD_ID")));
    report.detail(format!("root={}", paths.root.display()));
    for (name, path) in [
        ("parsed_dir", &paths.parsed_dir),
        ("indexes_dir", &paths.indexes_dir),
        ("runs_dir", &paths.runs_dir),
        ("logs_dir", &paths.logs_dir),
    ] {
        report.detail(format!("{name}={}", path.display()));
        if !path.exists() {
            report.warn(format!("{name} does not exist yet ({})", path.display()));
        }
    }

    report.detail(format!("ingest.tz={}", cfg.ingest.tz));
    report.detail(format!("ingest.offset_mode={:?}", cfg.ingest.offset_mode));
    report.detail(format!("ingest.splitter={}", cfg.ingest.splitter));

    for (key, value) in active_env_overrides() {
        report.detail(format!("env.{key}={value}"));
    }

    Ok(report)
}
