use crate::error::{LockError, Result, StorageOp};
use crate::lock::{FsStorage, LockStatus, Locker, Reclaim, DEFAULT_SUFFIX};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub dir: PathBuf,
    pub recursive: bool,
    /// Files whose name ends with this are treated as markers.
    pub suffix: String,
    pub dry_run: bool,
}

impl SweepConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SweepConfig {
            dir: dir.into(),
            recursive: false,
            suffix: DEFAULT_SUFFIX.to_string(),
            dry_run: false,
        }
    }
}

/// Remove markers in `config.dir` whose lease under `locker` has run out.
///
/// Returns the markers that were removed (or would be, in dry-run mode).
/// Live markers are left alone. The directory is listed on the local
/// filesystem, so only a filesystem-backed locker can judge what it finds.
pub fn sweep_expired(locker: &Locker<FsStorage>, config: &SweepConfig) -> Result<Vec<PathBuf>> {
    let mut swept = Vec::new();

    visit_directory(&config.dir, config.recursive, &mut |path| {
        if !is_marker(path, &config.suffix) {
            return;
        }

        if config.dry_run {
            match locker.marker_status(path) {
                Ok(LockStatus::Expired { .. }) => {
                    debug!("Would remove expired lock: {}", path.display());
                    swept.push(path.to_path_buf());
                }
                Ok(_) => debug!("Lock in use, skipping: {}", path.display()),
                Err(e) => warn!("Error checking lock {}: {}", path.display(), e),
            }
            return;
        }

        match locker.reclaim_if_expired(path) {
            Ok(Reclaim::Removed) => {
                debug!("Removed expired lock: {}", path.display());
                swept.push(path.to_path_buf());
            }
            Ok(Reclaim::Vanished) | Ok(Reclaim::Absent) => {
                debug!("Lock already removed: {}", path.display());
            }
            Ok(Reclaim::Live) => {
                debug!("Lock in use, skipping: {}", path.display());
            }
            Err(e) => warn!("Failed to sweep lock {}: {}", path.display(), e),
        }
    })?;

    Ok(swept)
}

fn visit_directory<F>(dir: &Path, recursive: bool, visitor: &mut F) -> Result<()>
where
    F: FnMut(&Path),
{
    let entries = fs::read_dir(dir).map_err(|e| LockError::io(StorageOp::Scan, dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| LockError::io(StorageOp::Scan, dir, e))?;
        let path = entry.path();

        // Get file type WITHOUT following symlinks
        let file_type = entry
            .file_type()
            .map_err(|e| LockError::io(StorageOp::Scan, &path, e))?;

        if file_type.is_symlink() {
            debug!("Skipping symlink: {}", path.display());
            continue;
        }

        if file_type.is_dir() && recursive {
            if let Err(e) = visit_directory(&path, recursive, visitor) {
                warn!("Skipping unreadable directory {}: {}", path.display(), e);
            }
        } else if file_type.is_file() {
            visitor(&path);
        }
    }
    Ok(())
}

fn is_marker(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.len() > suffix.len() && name.ends_with(suffix))
        .unwrap_or(false)
}
