use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();

    println!(
        "cargo:rustc-env=MEMSYNC_BUILD_ID={pkg}+{:x}.{:x}",
        stamp.as_secs(),
        stamp.subsec_nanos()
    );
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src");
}
