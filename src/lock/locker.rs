use super::guard::LockGuard;
use super::path::append_suffix;
use super::storage::{FsStorage, Storage};
use crate::error::{LockError, Result, StorageOp};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Lease applied when none is configured.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(60);

/// Suffix appended to a resource path to name its marker by default.
pub const DEFAULT_SUFFIX: &str = ".lock";

/// Maps a resource path to the path of its marker. Must be deterministic.
pub type MarkerNamer = Arc<dyn Fn(&Path) -> PathBuf + Send + Sync>;

/// What a read-only probe of a marker found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Unlocked,
    Held {
        modified: SystemTime,
        remaining: Duration,
    },
    /// A marker exists but its lease has run out; the next acquire reclaims it.
    Expired { modified: SystemTime, age: Duration },
}

impl LockStatus {
    pub fn is_held(&self) -> bool {
        matches!(self, LockStatus::Held { .. })
    }
}

/// Outcome of checking a marker for expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reclaim {
    Absent,
    Live,
    Removed,
    /// Expired, but someone else removed it first.
    Vanished,
}

/// Advisory, lease-based locks over named paths.
///
/// A `Locker` only holds configuration. All lock state lives in the marker
/// files, so one value can be cloned or shared freely between threads and
/// processes that agree on naming and lease.
#[derive(Clone)]
pub struct Locker<S = FsStorage> {
    storage: S,
    namer: MarkerNamer,
    lease: Duration,
}

impl Locker<FsStorage> {
    /// Filesystem-backed locker with a 60 second lease and `.lock` markers.
    pub fn new() -> Self {
        Self::with_storage(FsStorage)
    }
}

impl Default for Locker<FsStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Locker<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locker")
            .field("lease", &self.lease)
            .finish_non_exhaustive()
    }
}

impl<S> Locker<S> {
    pub fn with_storage(storage: S) -> Self {
        Locker {
            storage,
            namer: Arc::new(|path: &Path| append_suffix(path, DEFAULT_SUFFIX)),
            lease: DEFAULT_LEASE,
        }
    }

    /// Set the lease. A zero duration means "unset" and keeps the default.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = if lease.is_zero() { DEFAULT_LEASE } else { lease };
        self
    }

    /// Replace the marker naming function.
    pub fn with_namer<F>(mut self, namer: F) -> Self
    where
        F: Fn(&Path) -> PathBuf + Send + Sync + 'static,
    {
        self.namer = Arc::new(namer);
        self
    }

    /// Name markers by appending `suffix` instead of `.lock`.
    pub fn with_suffix(self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.with_namer(move |path| append_suffix(path, &suffix))
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn marker_path(&self, resource: impl AsRef<Path>) -> PathBuf {
        (self.namer)(resource.as_ref())
    }
}

impl<S: Storage> Locker<S> {
    /// Try to take the lock on `resource` without waiting.
    ///
    /// Returns [`LockError::Locked`] if a live marker exists, including when
    /// another caller creates one between the expiry check and our create.
    pub fn acquire(&self, resource: impl AsRef<Path>) -> Result<()> {
        let marker = self.marker_path(resource);
        debug!(
            "Acquiring lock: {} (lease: {:?})",
            marker.display(),
            self.lease
        );

        if self.reclaim_if_expired(&marker)? == Reclaim::Live {
            debug!("Lock is held: {}", marker.display());
            return Err(LockError::Locked(marker));
        }

        match self.storage.create_exclusive(&marker) {
            Ok(()) => {
                debug!("Lock acquired: {}", marker.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("Lost creation race for {}", marker.display());
                Err(LockError::Locked(marker))
            }
            Err(e) => Err(LockError::io(StorageOp::Create, marker, e)),
        }
    }

    /// Take the lock and hand back a guard that releases it on drop.
    pub fn acquire_guard(&self, resource: impl AsRef<Path>) -> Result<LockGuard<'_, S>> {
        let resource = resource.as_ref();
        self.acquire(resource)?;
        LockGuard::new(self, resource.to_path_buf()).map_err(|e| {
            // Don't leak a marker nobody holds a guard for
            let _ = self.release(resource);
            e
        })
    }

    /// Remove the marker. Releasing an unlocked resource succeeds.
    pub fn release(&self, resource: impl AsRef<Path>) -> Result<()> {
        let marker = self.marker_path(resource);

        match self.storage.remove(&marker) {
            Ok(()) => {
                debug!("Lock released: {}", marker.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Lock already released: {}", marker.display());
                Ok(())
            }
            Err(e) => Err(LockError::io(StorageOp::Remove, marker, e)),
        }
    }

    /// Push the marker's timestamp to now, extending the lease.
    ///
    /// An expired marker is reclaimed first, so renewing never revives a lock
    /// whose lease already ran out: the caller gets [`LockError::NotLocked`]
    /// and has to acquire again.
    pub fn renew(&self, resource: impl AsRef<Path>) -> Result<()> {
        let marker = self.marker_path(resource);

        // Absent and reclaimed markers fall through to the touch below,
        // which reports NotFound for them.
        self.reclaim_if_expired(&marker)?;

        let now = self.storage.now();
        match self.storage.set_modified(&marker, now) {
            Ok(()) => {
                debug!("Lock renewed: {}", marker.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Nothing to renew: {}", marker.display());
                Err(LockError::NotLocked(marker))
            }
            Err(e) => Err(LockError::io(StorageOp::Touch, marker, e)),
        }
    }

    /// Inspect the lock on `resource` without changing anything.
    pub fn status(&self, resource: impl AsRef<Path>) -> Result<LockStatus> {
        self.marker_status(&self.marker_path(resource))
    }

    pub(crate) fn marker_status(&self, marker: &Path) -> Result<LockStatus> {
        let modified = match self.storage.stat(marker) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LockStatus::Unlocked),
            Err(e) => return Err(LockError::io(StorageOp::Stat, marker, e)),
        };

        let age = self.age(modified);
        if age >= self.lease {
            Ok(LockStatus::Expired { modified, age })
        } else {
            Ok(LockStatus::Held {
                modified,
                remaining: self.lease - age,
            })
        }
    }

    /// Delete the marker if its lease has run out.
    pub(crate) fn reclaim_if_expired(&self, marker: &Path) -> Result<Reclaim> {
        match self.marker_status(marker)? {
            LockStatus::Unlocked => Ok(Reclaim::Absent),
            LockStatus::Held { .. } => Ok(Reclaim::Live),
            LockStatus::Expired { age, .. } => {
                debug!(
                    "Reclaiming expired lock: {} (age: {:?})",
                    marker.display(),
                    age
                );
                match self.storage.remove(marker) {
                    Ok(()) => Ok(Reclaim::Removed),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        debug!("Expired lock already reclaimed: {}", marker.display());
                        Ok(Reclaim::Vanished)
                    }
                    Err(e) => Err(LockError::io(StorageOp::Remove, marker, e)),
                }
            }
        }
    }

    fn age(&self, modified: SystemTime) -> Duration {
        // A timestamp ahead of our clock counts as brand new
        self.storage
            .now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO)
    }
}
