use crate::store::config::{IngestConfig, OffsetMode};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use std::time::{SystemTime, UNIX_EPOCH};

const LEGACY_OFFSET_SUFFIX: &str = "-07:00";

/// Return the current Unix epoch in seconds.
pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// ISO-8601 timestamp with an explicit offset, rendered per the configured offset mode.
pub fn format_created_at(now: DateTime<Utc>, ingest: &IngestConfig) -> Result<String> {
    match ingest.offset_mode {
        OffsetMode::Zone => {
            let tz: Tz = ingest
                .tz
                .trim()
                .parse()
                .map_err(|_| anyhow!("unknown timezone `{}`", ingest.tz))?;
            Ok(now
                .with_timezone(&tz)
                .format("%Y-%m-%dT%H:%M:%S%:z")
                .to_string())
        }
        OffsetMode::Fixed => Ok(format!(
            "{}{LEGACY_OFFSET_SUFFIX}",
            now.with_timezone(&Local).format("%Y-%m-%dT%H:%M:%S")
        )),
    }
}
