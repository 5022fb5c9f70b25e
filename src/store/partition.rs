use crate::error::MemsyncError;
use crate::store::paths::{
    ENTITIES_STREAM, LINKS_STREAM, MANIFEST_FILE, NODES_STREAM, TOPICS_STREAM,
};
use crate::store::record::{Manifest, ParsedArchive};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PartitionWrite {
    pub partition_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub node_count: usize,
}

/// Create the partition directory itself, failing on any existing entry.
///
/// `create_dir` is atomic, so of two writers racing for one date exactly one
/// wins and the other sees `Conflict` before touching a single stream.
pub fn create_partition_dir(partition_dir: &Path) -> Result<()> {
    if let Some(parent) = partition_dir.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    match fs::create_dir(partition_dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            Err(MemsyncError::Conflict(partition_dir.to_path_buf()).into())
        }
        Err(err) => Err(err).with_context(|| format!("failed to create {}", partition_dir.display())),
    }
}

fn create_new(path: &Path) -> Result<fs::File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|err| {
            if err.kind() == ErrorKind::AlreadyExists {
                anyhow::Error::new(MemsyncError::Conflict(path.to_path_buf()))
            } else {
                anyhow::Error::new(err).context(format!("failed to create {}", path.display()))
            }
        })
}

fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut out = BufWriter::new(create_new(path)?);
    for row in rows {
        serde_json::to_writer(&mut out, row)
            .with_context(|| format!("failed to serialize row for {}", path.display()))?;
        out.write_all(b"\n")?;
    }
    out.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    let data = serde_json::to_string_pretty(manifest)?;
    let mut file = create_new(path)?;
    file.write_all(format!("{data}\n").as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Write four record streams and the manifest into a fresh partition directory.
///
/// Streams land before the manifest, so a partition with `manifest.json`
/// always has all four streams.
pub fn write_partition(
    partition_dir: &Path,
    parsed: &ParsedArchive,
    manifest: &Manifest,
) -> Result<PartitionWrite> {
    create_partition_dir(partition_dir)?;

    let nodes = partition_dir.join(NODES_STREAM);
    let entities = partition_dir.join(ENTITIES_STREAM);
    let topics = partition_dir.join(TOPICS_STREAM);
    let links = partition_dir.join(LINKS_STREAM);
    let manifest_path = partition_dir.join(MANIFEST_FILE);

    write_jsonl(&nodes, &parsed.nodes)?;
    write_jsonl(&entities, &parsed.entities)?;
    write_jsonl(&topics, &parsed.topics)?;
    write_jsonl(&links, &parsed.links)?;
    write_manifest(&manifest_path, manifest)?;

    Ok(PartitionWrite {
        partition_dir: partition_dir.to_path_buf(),
        files: vec![nodes, entities, topics, links, manifest_path],
        node_count: parsed.nodes.len(),
    })
}
