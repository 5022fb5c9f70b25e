//! Independent re-read of a written partition.
//!
//! The validator trusts nothing the writer produced: every non-blank line of
//! every stream is parsed again and checked against its kind's required
//! fields. Findings accumulate; a bad line never stops the scan.

use crate::store::hasher;
use crate::store::paths::{ENTITIES_STREAM, LINKS_STREAM, NODES_STREAM, TOPICS_STREAM};
use crate::store::record::Span;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Node,
    Entity,
    Topic,
    Link,
}

pub const STREAM_ORDER: [RecordKind; 4] = [
    RecordKind::Node,
    RecordKind::Entity,
    RecordKind::Topic,
    RecordKind::Link,
];

impl RecordKind {
    pub fn stream(self) -> &'static str {
        match self {
            Self::Node => NODES_STREAM,
            Self::Entity => ENTITIES_STREAM,
            Self::Topic => TOPICS_STREAM,
            Self::Link => LINKS_STREAM,
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Node => &["id", "source_file", "span", "summary", "date", "created_at"],
            Self::Entity => &["name", "type"],
            Self::Topic => &["name"],
            Self::Link => &["src", "dst", "type"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.file, self.line, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationOutcome {
    pub partition_dir: String,
    pub lines_checked: usize,
    pub missing_files: Vec<String>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    pub fn ok(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Re-hash each node's `source_file` and compare against its recorded `sha256`.
    pub verify_digests: bool,
    /// Base for relative `source_file` paths.
    pub source_root: Option<PathBuf>,
}

struct StreamCheck<'a> {
    file: String,
    kind: RecordKind,
    opts: &'a ValidateOptions,
    seen_ids: HashMap<String, usize>,
}

impl StreamCheck<'_> {
    fn issue(&self, out: &mut ValidationOutcome, line: usize, message: impl Into<String>) {
        out.issues.push(ValidationIssue {
            file: self.file.clone(),
            line,
            message: message.into(),
        });
    }

    fn check_line(&mut self, out: &mut ValidationOutcome, line_no: usize, raw: &[u8]) {
        let Ok(text) = std::str::from_utf8(raw) else {
            self.issue(out, line_no, "invalid UTF-8");
            return;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        out.lines_checked += 1;

        let value: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(err) => {
                self.issue(out, line_no, format!("invalid JSON: {err}"));
                return;
            }
        };
        let Some(obj) = value.as_object() else {
            self.issue(out, line_no, "expected a JSON object");
            return;
        };

        let missing: Vec<&str> = self
            .kind
            .required_fields()
            .iter()
            .copied()
            .filter(|field| !obj.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            self.issue(
                out,
                line_no,
                format!("missing fields: {}", missing.join(", ")),
            );
        }

        if self.kind == RecordKind::Node {
            self.check_node(out, line_no, obj);
        }
    }

    fn check_node(&mut self, out: &mut ValidationOutcome, line_no: usize, obj: &Map<String, Value>) {
        if let Some(span) = obj.get("span") {
            if let Some(message) = span_problem(span) {
                self.issue(out, line_no, message);
            }
        }

        if let Some(id) = obj.get("id").and_then(Value::as_str) {
            if let Some(first) = self.seen_ids.get(id) {
                let message = format!("duplicate id `{id}` (first seen on line {first})");
                self.issue(out, line_no, message);
            } else {
                self.seen_ids.insert(id.to_string(), line_no);
            }
        }

        if self.opts.verify_digests {
            self.check_digest(out, line_no, obj);
        }
    }

    fn check_digest(&self, out: &mut ValidationOutcome, line_no: usize, obj: &Map<String, Value>) {
        let (Some(source), Some(recorded)) = (
            obj.get("source_file").and_then(Value::as_str),
            obj.get("sha256").and_then(Value::as_str),
        ) else {
            self.issue(out, line_no, "cannot verify digest: source_file or sha256 missing");
            return;
        };

        let mut path = PathBuf::from(source);
        if path.is_relative() {
            if let Some(root) = &self.opts.source_root {
                path = root.join(path);
            }
        }
        match hasher::digest_file(&path) {
            Ok(current) if current == recorded => {}
            Ok(current) => self.issue(
                out,
                line_no,
                format!("sha256 mismatch for {source}: recorded {recorded}, current {current}"),
            ),
            Err(err) => self.issue(out, line_no, format!("cannot re-hash {source}: {err:#}")),
        }
    }
}

fn span_problem(span: &Value) -> Option<String> {
    let Ok(span) = serde_json::from_value::<Span>(span.clone()) else {
        return Some("span must be an object with integer start_line and end_line".to_string());
    };
    if span.is_valid() {
        None
    } else if span.start_line < 1 {
        Some(format!("span start_line must be >= 1, got {}", span.start_line))
    } else {
        Some(format!(
            "span end_line {} is before start_line {}",
            span.end_line, span.start_line
        ))
    }
}

fn validate_stream(
    path: &Path,
    kind: RecordKind,
    opts: &ValidateOptions,
    out: &mut ValidationOutcome,
) -> Result<()> {
    let file = path.display().to_string();
    if !path.exists() {
        out.missing_files.push(file);
        return Ok(());
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut check = StreamCheck {
        file,
        kind,
        opts,
        seen_ids: HashMap::new(),
    };
    for (idx, line) in raw.split(|b| *b == b'\n').enumerate() {
        check.check_line(out, idx + 1, line);
    }
    Ok(())
}

pub fn validate_partition(partition_dir: &Path, opts: &ValidateOptions) -> Result<ValidationOutcome> {
    let mut out = ValidationOutcome {
        partition_dir: partition_dir.display().to_string(),
        ..ValidationOutcome::default()
    };
    for kind in STREAM_ORDER {
        validate_stream(&partition_dir.join(kind.stream()), kind, opts, &mut out)?;
    }
    Ok(out)
}
