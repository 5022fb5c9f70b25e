use crate::error::MemsyncError;
use crate::store::paths::StorePaths;
use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_TZ: &str = "America/Los_Angeles";

pub const CONFIG_PATH_ENV: &str = "MEMSYNC_CONFIG_PATH";
pub const TZ_ENV: &str = "MEMSYNC_TZ";
pub const OFFSET_MODE_ENV: &str = "MEMSYNC_OFFSET_MODE";
pub const SPLITTER_ENV: &str = "MEMSYNC_SPLITTER";
pub const CONFIG_ENV_KEYS: &[&str] = &[CONFIG_PATH_ENV, TZ_ENV, OFFSET_MODE_ENV, SPLITTER_ENV];

/// How `created_at` offsets are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffsetMode {
    /// Real offset of the configured zone at the stamped instant.
    Zone,
    /// Local wall-clock time with a literal `-07:00` suffix, as older partitions carry.
    Fixed,
}

impl FromStr for OffsetMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "zone" => Ok(Self::Zone),
            "fixed" | "legacy" => Ok(Self::Fixed),
            other => Err(anyhow!("invalid offset mode `{other}`: use `zone` or `fixed`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitterKind {
    WholeFile,
    Paragraph,
}

impl SplitterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WholeFile => "whole-file",
            Self::Paragraph => "paragraph",
        }
    }
}

impl fmt::Display for SplitterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitterKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "whole-file" | "whole_file" | "single" => Ok(Self::WholeFile),
            "paragraph" | "paragraphs" => Ok(Self::Paragraph),
            other => Err(anyhow!(
                "invalid splitter `{other}`: use `whole-file` or `paragraph`"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub tz: String,
    pub offset_mode: OffsetMode,
    pub splitter: SplitterKind,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            tz: DEFAULT_TZ.to_string(),
            offset_mode: OffsetMode::Zone,
            splitter: SplitterKind::WholeFile,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemsyncConfig {
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialMemsyncConfig {
    ingest: Option<IngestConfig>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate(cfg: &MemsyncConfig) -> Result<()> {
    let tz = cfg.ingest.tz.trim();
    if tz.is_empty() {
        return Err(MemsyncError::InvalidConfig("timezone label cannot be empty".into()).into());
    }
    if cfg.ingest.offset_mode == OffsetMode::Zone && tz.parse::<Tz>().is_err() {
        return Err(MemsyncError::InvalidConfig(format!(
            "unknown timezone `{tz}`; use an IANA name or offset_mode = \"fixed\""
        ))
        .into());
    }
    Ok(())
}

fn resolve_config_path(paths: &StorePaths) -> Option<PathBuf> {
    if let Some(custom) = non_empty(env::var(CONFIG_PATH_ENV).ok()) {
        return Some(PathBuf::from(custom));
    }

    let local = paths.root.join("memsync.toml");
    if local.exists() {
        return Some(local);
    }

    let home = dirs::home_dir()?;
    Some(home.join(".memsync").join("memsync.toml"))
}

fn merge_toml(base: &mut MemsyncConfig, raw: &str) -> Result<()> {
    let parsed: PartialMemsyncConfig = toml::from_str(raw)?;
    if let Some(ingest) = parsed.ingest {
        base.ingest = ingest;
    }
    Ok(())
}

fn merge_file_config(base: &mut MemsyncConfig, paths: &StorePaths) -> Result<()> {
    let Some(path) = resolve_config_path(paths) else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)
        .map_err(|err| MemsyncError::InvalidConfig(format!("{}: {err}", path.display())))?;
    merge_toml(base, &raw)
        .map_err(|err| MemsyncError::InvalidConfig(format!("{}: {err}", path.display())))?;
    Ok(())
}

/// Environment layer, taking the lookup as a parameter so tests never touch the process env.
pub fn apply_env_overrides(
    cfg: &mut MemsyncConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(tz) = non_empty(lookup(TZ_ENV)) {
        cfg.ingest.tz = tz;
    }
    if let Some(mode) = non_empty(lookup(OFFSET_MODE_ENV)) {
        cfg.ingest.offset_mode = mode
            .parse()
            .map_err(|err| MemsyncError::InvalidConfig(format!("{OFFSET_MODE_ENV}: {err}")))?;
    }
    if let Some(splitter) = non_empty(lookup(SPLITTER_ENV)) {
        cfg.ingest.splitter = splitter
            .parse()
            .map_err(|err| MemsyncError::InvalidConfig(format!("{SPLITTER_ENV}: {err}")))?;
    }
    Ok(())
}

pub fn load_config(paths: &StorePaths) -> Result<MemsyncConfig> {
    let mut cfg = MemsyncConfig::default();
    merge_file_config(&mut cfg, paths)?;
    apply_env_overrides(&mut cfg, |var| env::var(var).ok())?;
    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = MemsyncConfig::default();
        assert_eq!(cfg.ingest.tz, DEFAULT_TZ);
        assert_eq!(cfg.ingest.offset_mode, OffsetMode::Zone);
        assert_eq!(cfg.ingest.splitter, SplitterKind::WholeFile);
        validate(&cfg).expect("defaults validate");
    }

    #[test]
    fn toml_section_merges_over_defaults() {
        let mut cfg = MemsyncConfig::default();
        merge_toml(
            &mut cfg,
            "[ingest]\ntz = \"Europe/Berlin\"\nsplitter = \"paragraph\"\n",
        )
        .expect("merge");
        assert_eq!(cfg.ingest.tz, "Europe/Berlin");
        assert_eq!(cfg.ingest.splitter, SplitterKind::Paragraph);
        assert_eq!(cfg.ingest.offset_mode, OffsetMode::Zone);
    }

    #[test]
    fn env_overrides_win_and_blank_values_are_ignored() {
        let mut cfg = MemsyncConfig::default();
        apply_env_overrides(
            &mut cfg,
            lookup_from(&[
                ("MEMSYNC_TZ", "Asia/Tokyo"),
                ("MEMSYNC_OFFSET_MODE", "fixed"),
                ("MEMSYNC_SPLITTER", "  "),
            ]),
        )
        .expect("apply");
        assert_eq!(cfg.ingest.tz, "Asia/Tokyo");
        assert_eq!(cfg.ingest.offset_mode, OffsetMode::Fixed);
        assert_eq!(cfg.ingest.splitter, SplitterKind::WholeFile);
    }

    #[test]
    fn bad_env_enum_is_a_config_error() {
        let mut cfg = MemsyncConfig::default();
        let err = apply_env_overrides(&mut cfg, lookup_from(&[("MEMSYNC_SPLITTER", "words")]))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MemsyncError>(),
            Some(MemsyncError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_zone_is_rejected_only_in_zone_mode() {
        let mut cfg = MemsyncConfig::default();
        cfg.ingest.tz = "Mars/Olympus".to_string();
        assert!(validate(&cfg).is_err());

        cfg.ingest.offset_mode = OffsetMode::Fixed;
        validate(&cfg).expect("fixed mode records the label verbatim");
    }
}
