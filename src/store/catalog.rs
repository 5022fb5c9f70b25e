use crate::error::MemsyncError;
use crate::store::hasher;
use crate::store::paths::{NODES_STREAM, posix_string};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const VECTORS_FILE: &str = "positions_3d.jsonl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRun {
    pub run: String,
    pub vectors: String,
    pub nodes: String,
    pub archives_dir: String,
    pub vectors_sha256: String,
    pub nodes_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLatest {
    pub run: String,
    pub positions_jsonl: String,
    pub nodes_jsonl: String,
    pub archives_dir: String,
    pub positions_sha256: String,
    pub nodes_sha256: String,
}

impl From<&CatalogRun> for CatalogLatest {
    fn from(run: &CatalogRun) -> Self {
        Self {
            run: run.run.clone(),
            positions_jsonl: run.vectors.clone(),
            nodes_jsonl: run.nodes.clone(),
            archives_dir: run.archives_dir.clone(),
            positions_sha256: run.vectors_sha256.clone(),
            nodes_sha256: run.nodes_sha256.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub generated_at: u64,
    pub runs: Vec<CatalogRun>,
    pub latest: CatalogLatest,
}

#[derive(Debug, Clone)]
pub enum RunInspection {
    Complete {
        archives_dir: PathBuf,
        vectors: PathBuf,
        nodes: PathBuf,
    },
    Incomplete(&'static str),
}

#[derive(Debug, Clone)]
pub struct CatalogBuild {
    pub catalog: Catalog,
    pub skipped: Vec<(String, &'static str)>,
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            out.push(path);
        }
    }
    out.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(out)
}

/// Newest date partition (zero-padded names sort chronologically) that holds a nodes stream.
fn latest_nodes_stream(parsed_dir: &Path) -> Result<Option<PathBuf>> {
    if !parsed_dir.is_dir() {
        return Ok(None);
    }
    Ok(sorted_subdirs(parsed_dir)?
        .into_iter()
        .rev()
        .map(|date_dir| date_dir.join(NODES_STREAM))
        .find(|nodes| nodes.is_file()))
}

pub fn inspect_run(run_dir: &Path) -> Result<RunInspection> {
    let archives_dir = run_dir.join("archives");
    if !archives_dir.is_dir() {
        return Ok(RunInspection::Incomplete("missing archives/"));
    }
    let vectors = run_dir.join("vectors").join(VECTORS_FILE);
    if !vectors.is_file() {
        return Ok(RunInspection::Incomplete("missing vectors/positions_3d.jsonl"));
    }
    let Some(nodes) = latest_nodes_stream(&run_dir.join("parsed"))? else {
        return Ok(RunInspection::Incomplete("no parsed/<date>/nodes.jsonl"));
    };
    Ok(RunInspection::Complete {
        archives_dir,
        vectors,
        nodes,
    })
}

/// Scan every run under `runs_dir` in name order; the last complete run becomes `latest`.
pub fn build_catalog(runs_dir: &Path, generated_at: u64) -> Result<CatalogBuild> {
    let run_dirs = if runs_dir.is_dir() {
        sorted_subdirs(runs_dir)?
    } else {
        Vec::new()
    };

    let mut runs = Vec::new();
    let mut skipped = Vec::new();
    for run_dir in run_dirs {
        let name = run_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match inspect_run(&run_dir)? {
            RunInspection::Complete {
                archives_dir,
                vectors,
                nodes,
            } => runs.push(CatalogRun {
                run: name,
                vectors_sha256: hasher::digest_file(&vectors)?,
                nodes_sha256: hasher::digest_file(&nodes)?,
                vectors: posix_string(&vectors),
                nodes: posix_string(&nodes),
                archives_dir: posix_string(&archives_dir),
            }),
            RunInspection::Incomplete(reason) => skipped.push((name, reason)),
        }
    }

    let Some(last) = runs.last() else {
        return Err(MemsyncError::NoCompleteRuns(runs_dir.to_path_buf()).into());
    };
    let latest = CatalogLatest::from(last);

    Ok(CatalogBuild {
        catalog: Catalog {
            generated_at,
            runs,
            latest,
        },
        skipped,
    })
}

/// Replace the catalog via a temp file in the same directory, so readers never see a partial file.
pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let data = serde_json::to_string_pretty(catalog)?;
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(data.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_catalog(path: &Path) -> Result<Catalog> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[derive(Debug, Clone, Default)]
pub struct CatalogVerification {
    pub files_checked: usize,
    pub issues: Vec<String>,
}

impl CatalogVerification {
    pub fn ok(&self) -> bool {
        self.issues.is_empty()
    }

    fn check(&mut self, run: &str, label: &str, path: &str, recorded: &str) {
        self.files_checked += 1;
        match hasher::digest_file(Path::new(path)) {
            Ok(current) if current == recorded => {}
            Ok(current) => self.issues.push(format!(
                "run {run}: {label} {path} drifted: recorded {recorded}, current {current}"
            )),
            Err(err) => self
                .issues
                .push(format!("run {run}: {label} {path} unreadable: {err:#}")),
        }
    }
}

/// Re-hash every artifact the catalog names and report drift.
pub fn verify_catalog(catalog: &Catalog) -> CatalogVerification {
    let mut out = CatalogVerification::default();
    for run in &catalog.runs {
        out.check(&run.run, "nodes", &run.nodes, &run.nodes_sha256);
        out.check(&run.run, "vectors", &run.vectors, &run.vectors_sha256);
    }
    if !catalog.runs.iter().any(|r| r.run == catalog.latest.run) {
        out.issues.push(format!(
            "latest run {} is not listed in runs",
            catalog.latest.run
        ));
    }
    out
}
