use super::locker::{LockStatus, Locker};
use super::storage::{FsStorage, Storage};
use crate::error::{LockError, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// A held lock that is released when dropped.
///
/// The guard remembers the marker timestamp it last produced. A marker that
/// has since expired or been replaced belongs to someone else, so dropping
/// leaves it alone. Dropping never panics: a failed release is logged and the
/// marker is left to expire with its lease.
#[derive(Debug)]
pub struct LockGuard<'a, S: Storage = FsStorage> {
    locker: &'a Locker<S>,
    resource: PathBuf,
    stamp: SystemTime,
    released: bool,
}

impl<'a, S: Storage> LockGuard<'a, S> {
    pub(crate) fn new(locker: &'a Locker<S>, resource: PathBuf) -> Result<Self> {
        let stamp = current_stamp(locker, &resource)?;
        Ok(LockGuard {
            locker,
            resource,
            stamp,
            released: false,
        })
    }

    pub fn resource(&self) -> &Path {
        &self.resource
    }

    pub fn marker_path(&self) -> PathBuf {
        self.locker.marker_path(&self.resource)
    }

    /// Whether the marker is still the live one this guard produced.
    pub fn is_held(&self) -> Result<bool> {
        Ok(matches!(
            self.locker.status(&self.resource)?,
            LockStatus::Held { modified, .. } if modified == self.stamp
        ))
    }

    /// Extend the lease; see [`Locker::renew`].
    ///
    /// Fails with [`LockError::NotLocked`] once the marker is no longer ours,
    /// without touching the new holder's marker.
    pub fn renew(&mut self) -> Result<()> {
        if !self.is_held()? {
            return Err(LockError::NotLocked(self.marker_path()));
        }
        self.locker.renew(&self.resource)?;
        self.stamp = current_stamp(self.locker, &self.resource)?;
        Ok(())
    }

    /// Release now and report any failure instead of logging it.
    ///
    /// A marker that expired or changed hands is left in place and reported
    /// as [`LockError::NotLocked`]. A marker that is already gone is fine.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        match self.locker.status(&self.resource)? {
            LockStatus::Unlocked => Ok(()),
            LockStatus::Held { modified, .. } if modified == self.stamp => {
                self.locker.release(&self.resource)
            }
            _ => Err(LockError::NotLocked(self.marker_path())),
        }
    }
}

fn current_stamp<S: Storage>(locker: &Locker<S>, resource: &Path) -> Result<SystemTime> {
    match locker.status(resource)? {
        LockStatus::Held { modified, .. } | LockStatus::Expired { modified, .. } => Ok(modified),
        LockStatus::Unlocked => Err(LockError::NotLocked(locker.marker_path(resource))),
    }
}

impl<S: Storage> Drop for LockGuard<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.locker.status(&self.resource) {
            Ok(LockStatus::Held { modified, .. }) if modified == self.stamp => {
                match self.locker.release(&self.resource) {
                    Ok(()) => debug!("Lock guard dropped: {}", self.resource.display()),
                    Err(e) => warn!(
                        "Failed to release lock on {} (non-fatal): {}",
                        self.resource.display(),
                        e
                    ),
                }
            }
            Ok(LockStatus::Held { .. }) => warn!(
                "Lock on {} changed hands, leaving the new holder's marker",
                self.resource.display()
            ),
            Ok(LockStatus::Expired { .. }) => warn!(
                "Lease on {} ran out before the guard dropped, leaving marker for reclamation",
                self.resource.display()
            ),
            Ok(LockStatus::Unlocked) => {
                debug!("Lock already released: {}", self.resource.display())
            }
            Err(e) => warn!(
                "Failed to check lock on {} (non-fatal): {}",
                self.resource.display(),
                e
            ),
        }
    }
}
