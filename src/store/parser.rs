//! Archive parsers turn one raw archive file into record candidates.
//!
//! Every implementation shares the same contract: whole-file `sha256`, ids
//! derived from the date plus a short digest of the file name, and spans that
//! satisfy `end_line >= start_line >= 1`. Splitters differ only in how many
//! records they cut from the file.

use crate::error::MemsyncError;
use crate::store::config::SplitterKind;
use crate::store::hasher;
use crate::store::record::{NodeRecord, ParseStats, ParsedArchive, Span};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

pub const PLACEHOLDER_SUMMARY: &str = "Initial import (single-node).";

#[derive(Debug, Clone)]
pub struct ParseRequest<'a> {
    pub source: &'a Path,
    /// Path written into records and stats; see `StorePaths::recorded_source_path`.
    pub source_file: &'a str,
    pub date: NaiveDate,
    pub created_at: &'a str,
    pub tags: &'a [String],
}

pub trait ArchiveParser {
    fn name(&self) -> &'static str;
    fn parse(&self, req: &ParseRequest<'_>) -> Result<ParsedArchive>;
}

pub fn parser_for(kind: SplitterKind) -> Box<dyn ArchiveParser> {
    match kind {
        SplitterKind::WholeFile => Box::new(WholeFileParser),
        SplitterKind::Paragraph => Box::new(ParagraphParser),
    }
}

struct SourceText {
    text: String,
    sha256: String,
    file_name: String,
    source_file: String,
    line_count: usize,
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split on every line boundary: `\r\n`, lone `\r` or `\n`, vertical tab, form
/// feed, the file/group/record separators, NEL, and U+2028/U+2029. A trailing
/// break does not start an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if !is_line_break(ch) {
            continue;
        }
        lines.push(&text[start..idx]);
        start = idx + ch.len_utf8();
        if ch == '\r' {
            if let Some(&(next, '\n')) = chars.peek() {
                chars.next();
                start = next + 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn read_source(path: &Path, source_file: &str) -> Result<SourceText> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let sha256 = hasher::digest(&bytes);
    let text = String::from_utf8(bytes)
        .with_context(|| format!("failed to decode {} as UTF-8", path.display()))?;
    let line_count = split_lines(&text).len();
    if line_count == 0 {
        return Err(MemsyncError::EmptyArchive(path.to_path_buf()).into());
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(SourceText {
        text,
        sha256,
        file_name,
        source_file: source_file.to_string(),
        line_count,
    })
}

fn base_node_id(date: NaiveDate, file_name: &str) -> String {
    format!(
        "node_{}T000000_{}",
        date.format("%Y-%m-%d"),
        hasher::short_digest(file_name)
    )
}

fn build_node(
    source: &SourceText,
    req: &ParseRequest<'_>,
    id: String,
    span: Span,
    title: String,
    summary: String,
) -> NodeRecord {
    NodeRecord {
        id,
        source_file: source.source_file.clone(),
        span,
        title,
        summary,
        content_raw: format!("see {}", source.source_file),
        tags: req.tags.to_vec(),
        entities: Vec::new(),
        topics: Vec::new(),
        date: req.date.format("%Y-%m-%d").to_string(),
        created_at: req.created_at.to_string(),
        sha256: source.sha256.clone(),
    }
}

fn whole_file_node(source: &SourceText, req: &ParseRequest<'_>) -> NodeRecord {
    build_node(
        source,
        req,
        base_node_id(req.date, &source.file_name),
        Span {
            start_line: 1,
            end_line: source.line_count,
        },
        format!("Archive {}", source.file_name),
        PLACEHOLDER_SUMMARY.to_string(),
    )
}

fn finish(source: &SourceText, nodes: Vec<NodeRecord>) -> ParsedArchive {
    let stats = ParseStats {
        source: source.source_file.clone(),
        line_count: source.line_count,
        node_count: nodes.len(),
    };
    ParsedArchive {
        nodes,
        stats,
        ..ParsedArchive::default()
    }
}

/// One record covering the whole file.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeFileParser;

impl ArchiveParser for WholeFileParser {
    fn name(&self) -> &'static str {
        SplitterKind::WholeFile.as_str()
    }

    fn parse(&self, req: &ParseRequest<'_>) -> Result<ParsedArchive> {
        let source = read_source(req.source, req.source_file)?;
        let node = whole_file_node(&source, req);
        Ok(finish(&source, vec![node]))
    }
}

/// One record per run of non-blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphParser;

fn paragraph_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    let mut last = 0usize;
    for (idx, line) in split_lines(text).into_iter().enumerate() {
        let line_no = idx + 1;
        last = line_no;
        if line.trim().is_empty() {
            if let Some(start) = open.take() {
                spans.push(Span {
                    start_line: start,
                    end_line: line_no - 1,
                });
            }
        } else if open.is_none() {
            open = Some(line_no);
        }
    }
    if let Some(start) = open {
        spans.push(Span {
            start_line: start,
            end_line: last,
        });
    }
    spans
}

impl ArchiveParser for ParagraphParser {
    fn name(&self) -> &'static str {
        SplitterKind::Paragraph.as_str()
    }

    fn parse(&self, req: &ParseRequest<'_>) -> Result<ParsedArchive> {
        let source = read_source(req.source, req.source_file)?;
        let spans = paragraph_spans(&source.text);
        if spans.is_empty() {
            let node = whole_file_node(&source, req);
            return Ok(finish(&source, vec![node]));
        }

        let base_id = base_node_id(req.date, &source.file_name);
        let nodes = spans
            .into_iter()
            .enumerate()
            .map(|(idx, span)| {
                let n = idx + 1;
                build_node(
                    &source,
                    req,
                    format!("{base_id}_p{n:04}"),
                    span,
                    format!("Archive {} ¶{n}", source.file_name),
                    format!("Initial import (paragraph {n})."),
                )
            })
            .collect();
        Ok(finish(&source, nodes))
    }
}
