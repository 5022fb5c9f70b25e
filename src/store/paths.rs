use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const NODES_STREAM: &str = "nodes.jsonl";
pub const ENTITIES_STREAM: &str = "entities.jsonl";
pub const TOPICS_STREAM: &str = "topics.jsonl";
pub const LINKS_STREAM: &str = "links.jsonl";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const TAG_INDEX_FILE: &str = "tags.jsonl";
pub const CATALOG_FILE: &str = "memory_catalog.json";

pub const ROOT_ENV: &str = "MEMSYNC_ROOT";
pub const PARSED_DIR_ENV: &str = "MEMSYNC_PARSED_DIR";
pub const INDEXES_DIR_ENV: &str = "MEMSYNC_INDEXES_DIR";
pub const RUNS_DIR_ENV: &str = "MEMSYNC_RUNS_DIR";
pub const LOGS_DIR_ENV: &str = "MEMSYNC_LOGS_DIR";
pub const PATH_ENV_KEYS: &[&str] = &[
    ROOT_ENV,
    PARSED_DIR_ENV,
    INDEXES_DIR_ENV,
    RUNS_DIR_ENV,
    LOGS_DIR_ENV,
];

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    pub parsed_dir: PathBuf,
    pub indexes_dir: PathBuf,
    pub runs_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl StorePaths {
    pub fn under(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            parsed_dir: root.join("parsed"),
            indexes_dir: root.join("indexes"),
            runs_dir: root.join("runs"),
            logs_dir: root.join("logs"),
        }
    }

    pub fn partition_dir(&self, date: &str) -> PathBuf {
        self.parsed_dir.join(date)
    }

    pub fn tag_index_path(&self) -> PathBuf {
        self.indexes_dir.join(TAG_INDEX_FILE)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.indexes_dir.join(CATALOG_FILE)
    }

    /// Path stored as a record's `source_file`: relative to `root` when the
    /// archive lives under it, absolute otherwise. Either form resolves
    /// against `root` regardless of the working directory.
    pub fn recorded_source_path(&self, archive: &Path) -> Result<String> {
        let cwd = env::current_dir().context("failed to resolve current directory")?;
        Ok(relative_to_root(&cwd.join(&self.root), &cwd.join(archive)))
    }
}

fn relative_to_root(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => posix_string(rel),
        _ => posix_string(path),
    }
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<StorePaths> {
    let cwd = env::current_dir().context("failed to resolve current directory")?;
    let root = env_or_default_path(ROOT_ENV, cwd);
    let defaults = StorePaths::under(&root);

    Ok(StorePaths {
        parsed_dir: env_or_default_path(PARSED_DIR_ENV, defaults.parsed_dir),
        indexes_dir: env_or_default_path(INDEXES_DIR_ENV, defaults.indexes_dir),
        runs_dir: env_or_default_path(RUNS_DIR_ENV, defaults.runs_dir),
        logs_dir: env_or_default_path(LOGS_DIR_ENV, defaults.logs_dir),
        root,
    })
}

/// Forward-slash rendering used for every path recorded inside JSON artifacts.
pub fn posix_string(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}
