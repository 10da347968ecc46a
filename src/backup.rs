use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Copies `path` to the first free name among `<path>.bak`, `<path>.bak.1`,
/// `<path>.bak.2`, ...
///
/// Returns `None` when there is nothing to back up or the copy failed. A
/// failure is logged and never escalated.
pub fn create_backup(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }

    let target = next_backup_path(path);
    match std::fs::copy(path, &target) {
        Ok(_) => {
            info!("created backup: {}", target.display());
            Some(target)
        }
        Err(err) => {
            error!("failed to create backup of {}: {err}", path.display());
            None
        }
    }
}

/// First backup name for `path` that does not exist yet.
pub fn next_backup_path(path: &Path) -> PathBuf {
    let first = with_appended(path, ".bak");
    if !first.exists() {
        return first;
    }
    (1u64..)
        .map(|n| with_appended(path, &format!(".bak.{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

fn with_appended(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
