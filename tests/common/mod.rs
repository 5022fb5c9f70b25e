use std::path::Path;

/// `memsync` rooted at `root`, with every config-affecting variable pinned so
/// the host environment cannot leak in.
pub fn memsync_at(cwd: &Path, root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("memsync");
    cmd.current_dir(cwd)
        .env("MEMSYNC_ROOT", root)
        .env("MEMSYNC_CONFIG_PATH", root.join("no-such-config.toml"))
        .env_remove("MEMSYNC_PARSED_DIR")
        .env_remove("MEMSYNC_INDEXES_DIR")
        .env_remove("MEMSYNC_RUNS_DIR")
        .env_remove("MEMSYNC_LOGS_DIR")
        .env_remove("MEMSYNC_TZ")
        .env_remove("MEMSYNC_OFFSET_MODE")
        .env_remove("MEMSYNC_SPLITTER")
        .env_remove("MEMSYNC_LOG");
    cmd
}

pub fn memsync(root: &Path) -> assert_cmd::Command {
    memsync_at(root, root)
}
