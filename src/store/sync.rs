use crate::error::MemsyncError;
use crate::logging;
use crate::store::audit;
use crate::store::catalog::{CatalogBuild, build_catalog, write_catalog};
use crate::store::paths::StorePaths;
use crate::store::util::now_epoch_secs;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const RUN_SUBDIRS: [&str; 3] = ["archives", "parsed", "vectors"];
const BUILD_PREFIX: &str = "MemoryBuild_";

#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    pub source: PathBuf,
    pub commit: bool,
    pub branch: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub run_name: String,
    pub run_dir: PathBuf,
    pub copied: Vec<String>,
    pub missing: Vec<String>,
    pub files_copied: usize,
    pub catalog: CatalogBuild,
    pub catalog_path: PathBuf,
    pub committed: bool,
    pub push_error: Option<String>,
}

pub fn run_name_for(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.strip_prefix(BUILD_PREFIX)
        .map(ToOwned::to_owned)
        .unwrap_or(name)
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    fs::create_dir_all(to).with_context(|| format!("failed to create {}", to.display()))?;
    let mut copied = 0usize;
    for entry in fs::read_dir(from).with_context(|| format!("failed to read {}", from.display()))? {
        let entry = entry?;
        let path = entry.path();
        let target = to.join(entry.file_name());
        if path.is_dir() {
            copied += copy_tree(&path, &target)?;
        } else {
            fs::copy(&path, &target).with_context(|| {
                format!("failed to copy {} to {}", path.display(), target.display())
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn create_run_dir(run_dir: &Path) -> Result<()> {
    if let Some(parent) = run_dir.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    match fs::create_dir(run_dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            Err(MemsyncError::Conflict(run_dir.to_path_buf()).into())
        }
        Err(err) => Err(err).with_context(|| format!("failed to create {}", run_dir.display())),
    }
}

fn run_git(git: &Path, repo: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new(git)
        .args(args)
        .current_dir(repo)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;
    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

fn commit_run(repo: &Path, run_name: &str, branch: Option<&str>) -> Result<Option<String>> {
    let git = which::which("git").context("git binary unavailable on PATH")?;
    if let Some(branch) = branch {
        run_git(&git, repo, &["checkout", branch])?;
    }
    run_git(&git, repo, &["add", "."])?;
    let message = format!("Add run {run_name} + rebuild index");
    run_git(&git, repo, &["commit", "-m", &message])?;

    match run_git(&git, repo, &["push"]) {
        Ok(()) => Ok(None),
        Err(err) => Ok(Some(format!("{err:#}"))),
    }
}

/// Copy a build folder in as `runs/<name>`, then rebuild the catalog over every run.
pub fn sync_run(paths: &StorePaths, req: &SyncRequest) -> Result<SyncOutcome> {
    if !req.source.is_dir() {
        return Err(MemsyncError::SourceNotFound(req.source.clone()).into());
    }
    let run_name = run_name_for(&req.source);
    if run_name.trim().is_empty() {
        return Err(MemsyncError::SourceNotFound(req.source.clone()).into());
    }
    let run_dir = paths.runs_dir.join(&run_name);
    create_run_dir(&run_dir)?;

    let mut copied = Vec::new();
    let mut missing = Vec::new();
    let mut files_copied = 0usize;
    for sub in RUN_SUBDIRS {
        let from = req.source.join(sub);
        if !from.is_dir() {
            let source_str = req.source.display().to_string();
            logging::warn("RUN_SUBDIR_MISSING", &[("subdir", sub), ("source", source_str.as_str())]);
            missing.push(sub.to_string());
            continue;
        }
        files_copied += copy_tree(&from, &run_dir.join(sub))?;
        copied.push(sub.to_string());
    }

    let catalog = build_catalog(&paths.runs_dir, now_epoch_secs()?)?;
    let catalog_path = paths.catalog_path();
    write_catalog(&catalog_path, &catalog.catalog)?;

    let mut committed = false;
    let mut push_error = None;
    if req.commit {
        push_error = commit_run(&paths.root, &run_name, req.branch.as_deref())?;
        committed = true;
        if let Some(err) = &push_error {
            logging::warn("GIT_PUSH_FAILED", &[("run", run_name.as_str()), ("err", err.as_str())]);
        }
    }

    audit::record(
        paths,
        "sync",
        "ok",
        &format!("{} files={files_copied} committed={committed}", run_dir.display()),
    );

    Ok(SyncOutcome {
        run_name,
        run_dir,
        copied,
        missing,
        files_copied,
        catalog,
        catalog_path,
        committed,
        push_error,
    })
}
