use std::env;
use std::path::PathBuf;

use crate::store::paths::ROOT_ENV;

fn fallback_dotenv_path(store_root: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(root) = store_root {
        return Some(root.join(".env"));
    }
    Some(home_dir?.join(".memsync/.env"))
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os(ROOT_ENV).map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}
