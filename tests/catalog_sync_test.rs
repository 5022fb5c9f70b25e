mod common;

use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use common::memsync;

fn write_run(dir: &Path, dates: &[&str]) {
    fs::create_dir_all(dir.join("archives")).expect("mkdir archives");
    fs::write(dir.join("archives/2025-10-27_chat.txt"), "hello\n").expect("write archive");
    fs::create_dir_all(dir.join("vectors")).expect("mkdir vectors");
    fs::write(
        dir.join("vectors/positions_3d.jsonl"),
        format!("{{\"id\":\"{}\",\"x\":0,\"y\":0,\"z\":0}}\n", dir.display()),
    )
    .expect("write vectors");
    for date in dates {
        let partition = dir.join("parsed").join(date);
        fs::create_dir_all(&partition).expect("mkdir partition");
        fs::write(
            partition.join("nodes.jsonl"),
            format!("{{\"id\":\"node_{date}\"}}\n"),
        )
        .expect("write nodes");
    }
}

fn read_catalog(root: &Path) -> Value {
    let raw =
        fs::read_to_string(root.join("indexes/memory_catalog.json")).expect("read catalog");
    serde_json::from_str(&raw).expect("catalog json")
}

#[test]
fn catalog_picks_newest_complete_run() {
    let tmp = tempdir().expect("tempdir");
    let runs = tmp.path().join("runs");
    write_run(&runs.join("20251027T090000"), &["2025-10-27"]);
    write_run(&runs.join("20251028T090000"), &["2025-10-27", "2025-10-28"]);
    write_run(&runs.join("20251029T090000"), &["2025-10-29"]);
    fs::create_dir_all(runs.join("20251030T090000/archives")).expect("mkdir incomplete run");

    memsync(tmp.path())
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("latest=20251029T090000"))
        .stdout(predicate::str::contains("[WARN] skipped run 20251030T090000"));

    let catalog = read_catalog(tmp.path());
    let names: Vec<&str> = catalog["runs"]
        .as_array()
        .expect("runs array")
        .iter()
        .filter_map(|run| run["run"].as_str())
        .collect();
    assert_eq!(
        names,
        ["20251027T090000", "20251028T090000", "20251029T090000"]
    );
    assert_eq!(catalog["latest"]["run"], "20251029T090000");
    assert!(
        catalog["runs"][1]["nodes"]
            .as_str()
            .is_some_and(|p| p.ends_with("parsed/2025-10-28/nodes.jsonl"))
    );
    assert_eq!(
        catalog["latest"]["positions_sha256"]
            .as_str()
            .map(str::len),
        Some(64)
    );

    memsync(tmp.path())
        .arg("catalog-verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn catalog_without_complete_runs_fails() {
    let tmp = tempdir().expect("tempdir");
    fs::create_dir_all(tmp.path().join("runs/20251030T090000/archives")).expect("mkdir run");

    memsync(tmp.path())
        .arg("catalog")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no complete runs"));

    assert!(!tmp.path().join("indexes/memory_catalog.json").exists());
}

#[test]
fn catalog_verify_detects_changed_artifact() {
    let tmp = tempdir().expect("tempdir");
    let run = tmp.path().join("runs/20251027T090000");
    write_run(&run, &["2025-10-27"]);

    memsync(tmp.path()).arg("catalog").assert().success();
    fs::write(run.join("vectors/positions_3d.jsonl"), "{\"id\":\"changed\"}\n")
        .expect("tamper vectors");

    memsync(tmp.path())
        .arg("catalog-verify")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("positions_3d.jsonl"))
        .stdout(predicate::str::contains("FAIL"));
}

#[test]
fn catalog_verify_without_catalog_fails() {
    let tmp = tempdir().expect("tempdir");
    memsync(tmp.path())
        .arg("catalog-verify")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("catalog missing"));
}

#[test]
fn sync_imports_build_and_rebuilds_catalog() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("repo");
    fs::create_dir_all(&root).expect("mkdir repo");
    let build = tmp.path().join("MemoryBuild_20251031T120000");
    write_run(&build, &["2025-10-31"]);

    memsync(&root)
        .arg("sync")
        .arg(&build)
        .assert()
        .success()
        .stdout(predicate::str::contains("run=20251031T120000"))
        .stdout(predicate::str::contains("committed=false"));

    assert!(
        root.join("runs/20251031T120000/parsed/2025-10-31/nodes.jsonl")
            .is_file()
    );
    assert_eq!(read_catalog(&root)["latest"]["run"], "20251031T120000");

    memsync(&root)
        .arg("sync")
        .arg(&build)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn sync_missing_source_is_usage_error() {
    let tmp = tempdir().expect("tempdir");
    memsync(tmp.path())
        .args(["sync", "MemoryBuild_nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn status_lists_resolved_layout() {
    let tmp = tempdir().expect("tempdir");
    memsync(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("parsed_dir="))
        .stdout(predicate::str::contains("ingest.splitter="))
        .stdout(predicate::str::contains("env.MEMSYNC_ROOT="));
}
