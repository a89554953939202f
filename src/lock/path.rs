use crate::error::{LockError, Result};
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Append `suffix` to the full file name: `data/a.txt` becomes `data/a.txt.lock`.
pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Marker path for `resource` inside a shared `dir`.
///
/// Format: `{parent}.{filename}.{hash}.lock`, where the hash is the first 8
/// hex chars of the SHA-256 of the resource path. The parent directory is
/// canonicalized when it exists so different spellings of the same file
/// share a marker.
pub fn hashed_marker_path(resource: &Path, dir: &Path) -> PathBuf {
    let resolved = resolve(resource);

    let filename = resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());

    let parent_name = resolved
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());

    let mut hasher = Sha256::new();
    hasher.update(resolved.to_string_lossy().as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    dir.join(format!("{}.{}.{}.lock", parent_name, filename, &hash[..8]))
}

/// A namer for [`Locker::with_namer`](crate::Locker::with_namer) that keeps
/// every marker in `dir`.
pub fn cache_dir_namer(dir: PathBuf) -> impl Fn(&Path) -> PathBuf + Send + Sync + 'static {
    move |resource: &Path| hashed_marker_path(resource, &dir)
}

// Only the parent is canonicalized, so the name does not change when the
// resource itself is created, removed or replaced by a symlink.
fn resolve(resource: &Path) -> PathBuf {
    match (resource.parent(), resource.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| resource.to_path_buf()),
        _ => resource.to_path_buf(),
    }
}

/// Get the platform-specific cache directory for markers, creating it if needed.
///
/// Fails when no home directory can be determined; pass an explicit
/// directory instead in that case.
pub fn default_cache_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "leaselock").ok_or_else(|| {
        LockError::Other("Failed to determine lock cache directory".to_string())
    })?;

    let cache_dir = proj_dirs.cache_dir().join("locks");

    if !cache_dir.exists() {
        fs::create_dir_all(&cache_dir).map_err(|e| LockError::CacheDirectoryFailed {
            path: cache_dir.clone(),
            source: e,
        })?;
    }

    Ok(cache_dir)
}

/// Reject a marker that would land on the resource itself.
pub fn validate_marker_path(marker: &Path, resource: &Path) -> Result<()> {
    let marker_canonical = marker
        .canonicalize()
        .unwrap_or_else(|_| marker.to_path_buf());
    let resource_canonical = resource
        .canonicalize()
        .unwrap_or_else(|_| resource.to_path_buf());

    if marker_canonical == resource_canonical {
        return Err(LockError::MarkerCollision {
            marker: marker.to_path_buf(),
            resource: resource.to_path_buf(),
        });
    }

    Ok(())
}
