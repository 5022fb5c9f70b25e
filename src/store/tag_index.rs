use crate::store::record::NodeRecord;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub tag: String,
    pub node_id: String,
    pub date: String,
}

pub fn entries_for(nodes: &[NodeRecord]) -> Vec<TagEntry> {
    nodes
        .iter()
        .flat_map(|node| {
            node.tags.iter().map(move |tag| TagEntry {
                tag: tag.clone(),
                node_id: node.id.clone(),
                date: node.date.clone(),
            })
        })
        .collect()
}

/// Append one entry per `(node, tag)` pair. Nothing is created when no node carries a tag.
///
/// Unlike partition streams this file is append-or-create, and the append holds an
/// exclusive advisory lock so concurrent ingests of different dates keep whole lines.
pub fn append_tags(index_path: &Path, nodes: &[NodeRecord]) -> Result<usize> {
    let entries = entries_for(nodes);
    if entries.is_empty() {
        return Ok(0);
    }

    if let Some(parent) = index_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut out = String::new();
    for entry in &entries {
        out.push_str(&serde_json::to_string(entry)?);
        out.push('\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(index_path)
        .with_context(|| format!("failed to open {}", index_path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("failed to lock {}", index_path.display()))?;
    let written = file
        .write_all(out.as_bytes())
        .and_then(|_| file.flush())
        .with_context(|| format!("failed to append {}", index_path.display()));
    let _ = file.unlock();
    written?;

    Ok(entries.len())
}

pub fn read_entries(index_path: &Path) -> Result<Vec<TagEntry>> {
    if !index_path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(index_path)
        .with_context(|| format!("failed to read {}", index_path.display()))?;
    let mut out = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let entry: TagEntry = serde_json::from_str(trimmed).with_context(|| {
            format!("failed to parse {}:{}", index_path.display(), idx + 1)
        })?;
        out.push(entry);
    }
    Ok(out)
}

pub fn lookup(index_path: &Path, tag: &str) -> Result<Vec<TagEntry>> {
    let wanted = tag.trim();
    Ok(read_entries(index_path)?
        .into_iter()
        .filter(|entry| entry.tag == wanted)
        .collect())
}
