use dirs::data_dir;
use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DATA_DIR_ENV: &str = "CLUB_SCRAPE_DATA_DIR";

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("club-scrape")
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join("config.json")
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %err, "failed to create parent");
        }
    }
}

/// Sibling path used for write-then-rename saves.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
