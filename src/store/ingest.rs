use crate::error::MemsyncError;
use crate::logging;
use crate::store::audit;
use crate::store::config::{MemsyncConfig, validate};
use crate::store::parser::{ParseRequest, parser_for};
use crate::store::partition::{PartitionWrite, write_partition};
use crate::store::paths::StorePaths;
use crate::store::record::Manifest;
use crate::store::tag_index;
use crate::store::util::format_created_at;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub archive: PathBuf,
    pub tz: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub date: String,
    pub parser: &'static str,
    pub created_at: String,
    pub tz: String,
    pub line_count: usize,
    pub partition: PartitionWrite,
    pub tags_appended: usize,
    pub tag_index_path: PathBuf,
}

fn is_date_shape(prefix: &[u8]) -> bool {
    prefix.len() == 10
        && prefix.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Archive names must start with `YYYY-MM-DD_`, and the prefix must be a real calendar day.
pub fn date_from_archive_name(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    if bytes.len() < 11 || bytes[10] != b'_' || !is_date_shape(&bytes[..10]) {
        return None;
    }
    NaiveDate::parse_from_str(&name[..10], "%Y-%m-%d").ok()
}

/// Parse a `--date` style argument with the same strictness as archive names.
pub fn parse_partition_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if !is_date_shape(trimmed.as_bytes()) {
        return Err(MemsyncError::BadDate(raw.to_string()).into());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| anyhow::Error::new(MemsyncError::BadDate(raw.to_string())))
}

/// Trim, drop empties, and dedupe while keeping first-seen order.
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in raw {
        let trimmed = tag.trim();
        if trimmed.is_empty() || out.iter().any(|t| t == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

pub fn ingest_archive(
    paths: &StorePaths,
    cfg: &MemsyncConfig,
    req: &IngestRequest,
) -> Result<IngestOutcome> {
    ingest_archive_at(paths, cfg, req, Utc::now())
}

pub fn ingest_archive_at(
    paths: &StorePaths,
    cfg: &MemsyncConfig,
    req: &IngestRequest,
    now: DateTime<Utc>,
) -> Result<IngestOutcome> {
    if !req.archive.is_file() {
        return Err(MemsyncError::ArchiveNotFound(req.archive.clone()).into());
    }
    let file_name = req
        .archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let Some(date) = date_from_archive_name(&file_name) else {
        return Err(MemsyncError::BadArchiveName(file_name).into());
    };

    let mut ingest_cfg = cfg.clone();
    if let Some(tz) = req.tz.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        ingest_cfg.ingest.tz = tz.to_string();
        validate(&ingest_cfg)?;
    }
    let ingest = &ingest_cfg.ingest;

    let created_at = format_created_at(now, ingest)?;
    let tags = normalize_tags(&req.tags);
    let parser = parser_for(ingest.splitter);
    let source_file = paths.recorded_source_path(&req.archive)?;
    let parsed = parser.parse(&ParseRequest {
        source: &req.archive,
        source_file: &source_file,
        date,
        created_at: &created_at,
        tags: &tags,
    })?;

    let date_str = date.format("%Y-%m-%d").to_string();
    let partition_dir = paths.partition_dir(&date_str);
    let manifest = Manifest::new(
        created_at.clone(),
        ingest.tz.clone(),
        parser.name(),
        parsed.stats.clone(),
    );

    let partition = match write_partition(&partition_dir, &parsed, &manifest) {
        Ok(partition) => partition,
        Err(err) => {
            let partition_str = partition_dir.display().to_string();
            logging::warn(
                "PARTITION_WRITE_FAILED",
                &[
                    ("date", date_str.as_str()),
                    ("partition", partition_str.as_str()),
                    ("err", format!("{err:#}").as_str()),
                ],
            );
            audit::record(paths, "ingest", "failed", &format!("{partition_str}: {err:#}"));
            return Err(err);
        }
    };

    let tag_index_path = paths.tag_index_path();
    let tags_appended = tag_index::append_tags(&tag_index_path, &parsed.nodes)?;

    let partition_str = partition.partition_dir.display().to_string();
    logging::info(
        "PARTITION_WRITTEN",
        &[
            ("date", date_str.as_str()),
            ("partition", partition_str.as_str()),
            ("nodes", partition.node_count.to_string().as_str()),
            ("tags", tags_appended.to_string().as_str()),
        ],
    );
    audit::record(
        paths,
        "ingest",
        "ok",
        &format!(
            "{partition_str} nodes={} tags={tags_appended}",
            partition.node_count
        ),
    );

    Ok(IngestOutcome {
        date: date_str,
        parser: parser.name(),
        created_at,
        tz: ingest.tz.clone(),
        line_count: parsed.stats.line_count,
        partition,
        tags_appended,
        tag_index_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::config::{OffsetMode, SplitterKind};
    use crate::store::paths::NODES_STREAM;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 27, 16, 0, 0).unwrap()
    }

    #[test]
    fn archive_name_prefix_rules() {
        assert_eq!(
            date_from_archive_name("2025-10-27_chat_full.txt"),
            NaiveDate::from_ymd_opt(2025, 10, 27)
        );
        assert_eq!(date_from_archive_name("2025-10-27.txt"), None);
        assert_eq!(date_from_archive_name("chat_2025-10-27_full.txt"), None);
        assert_eq!(date_from_archive_name("2025-1-27_chat.txt"), None);
        assert_eq!(date_from_archive_name("2025-02-30_chat.txt"), None);
        assert_eq!(date_from_archive_name("2025-10-27"), None);
    }

    #[test]
    fn partition_date_argument_is_strict() {
        assert!(parse_partition_date("2025-10-27").is_ok());
        assert!(parse_partition_date("20251027").is_err());
        assert!(parse_partition_date("2025-13-01").is_err());
    }

    #[test]
    fn tags_are_trimmed_and_deduped_in_order() {
        let raw = vec![
            " ros ".to_string(),
            "python".to_string(),
            "".to_string(),
            "ros".to_string(),
        ];
        assert_eq!(normalize_tags(&raw), vec!["ros", "python"]);
    }

    #[test]
    fn ingest_writes_partition_tags_and_audit() {
        let tmp = tempdir().expect("tempdir");
        let paths = StorePaths::under(tmp.path());
        let archive = tmp.path().join("archives/2025-10-27_chat_full.txt");
        fs::create_dir_all(archive.parent().unwrap()).expect("mkdir");
        fs::write(&archive, "a\nb\nc\n").expect("write");

        let out = ingest_archive_at(
            &paths,
            &MemsyncConfig::default(),
            &IngestRequest {
                archive: archive.clone(),
                tz: Some("UTC".to_string()),
                tags: vec!["ros".to_string()],
            },
            at(),
        )
        .expect("ingest");

        assert_eq!(out.date, "2025-10-27");
        assert_eq!(out.created_at, "2025-10-27T16:00:00+00:00");
        assert_eq!(out.tz, "UTC");
        assert_eq!(out.line_count, 3);
        assert_eq!(out.tags_appended, 1);
        let nodes = fs::read_to_string(paths.partition_dir("2025-10-27").join(NODES_STREAM))
            .expect("read nodes");
        let node: crate::store::record::NodeRecord =
            serde_json::from_str(nodes.trim()).expect("node json");
        assert_eq!(node.source_file, "archives/2025-10-27_chat_full.txt");
        assert_eq!(
            tag_index::lookup(&paths.tag_index_path(), "ros")
                .expect("lookup")
                .len(),
            1
        );
        assert!(audit::audit_log_path(&paths).is_file());
    }

    #[test]
    fn second_ingest_for_same_date_conflicts() {
        let tmp = tempdir().expect("tempdir");
        let paths = StorePaths::under(tmp.path());
        let first = tmp.path().join("2025-10-27_a.txt");
        let second = tmp.path().join("2025-10-27_b.txt");
        fs::write(&first, "one\n").expect("write");
        fs::write(&second, "two\n").expect("write");
        let cfg = MemsyncConfig::default();

        ingest_archive_at(
            &paths,
            &cfg,
            &IngestRequest {
                archive: first,
                ..IngestRequest::default()
            },
            at(),
        )
        .expect("first");
        let err = ingest_archive_at(
            &paths,
            &cfg,
            &IngestRequest {
                archive: second,
                ..IngestRequest::default()
            },
            at(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MemsyncError>(),
            Some(MemsyncError::Conflict(_))
        ));
    }

    #[test]
    fn usage_errors_are_typed() {
        let tmp = tempdir().expect("tempdir");
        let paths = StorePaths::under(tmp.path());
        let cfg = MemsyncConfig::default();

        let missing = ingest_archive_at(
            &paths,
            &cfg,
            &IngestRequest {
                archive: tmp.path().join("2025-10-27_missing.txt"),
                ..IngestRequest::default()
            },
            at(),
        )
        .unwrap_err();
        assert!(matches!(
            missing.downcast_ref::<MemsyncError>(),
            Some(MemsyncError::ArchiveNotFound(_))
        ));

        let badly_named = tmp.path().join("notes.txt");
        fs::write(&badly_named, "x\n").expect("write");
        let err = ingest_archive_at(
            &paths,
            &cfg,
            &IngestRequest {
                archive: badly_named,
                ..IngestRequest::default()
            },
            at(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MemsyncError>(),
            Some(MemsyncError::BadArchiveName(_))
        ));
        assert!(!paths.parsed_dir.exists());
    }

    #[test]
    fn paragraph_splitter_is_selected_by_config() {
        let tmp = tempdir().expect("tempdir");
        let paths = StorePaths::under(tmp.path());
        let archive = tmp.path().join("2025-10-28_notes.txt");
        fs::write(&archive, "one\n\ntwo\n").expect("write");
        let mut cfg = MemsyncConfig::default();
        cfg.ingest.splitter = SplitterKind::Paragraph;
        cfg.ingest.offset_mode = OffsetMode::Fixed;

        let out = ingest_archive_at(
            &paths,
            &cfg,
            &IngestRequest {
                archive,
                ..IngestRequest::default()
            },
            at(),
        )
        .expect("ingest");
        assert_eq!(out.parser, "paragraph");
        assert_eq!(out.partition.node_count, 2);
        assert!(out.created_at.ends_with("-07:00"));
    }
}
