use filetime::FileTime;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Primitives a [`Locker`](crate::Locker) needs from the place markers live.
///
/// "Does not exist" must surface as [`io::ErrorKind::NotFound`] and a lost
/// exclusive create as [`io::ErrorKind::AlreadyExists`]. Only
/// `create_exclusive` has to be atomic across processes.
pub trait Storage: Send + Sync {
    /// Last modification time of the marker.
    fn stat(&self, path: &Path) -> io::Result<SystemTime>;

    /// Create the marker, failing if anything already exists at `path`.
    fn create_exclusive(&self, path: &Path) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Set the marker's modification time without creating it.
    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()>;

    fn now(&self) -> SystemTime;
}

/// Markers as plain files on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn stat(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn create_exclusive(&self, path: &Path) -> io::Result<()> {
        // O_CREAT|O_EXCL; the handle is closed as soon as it drops
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(drop)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
        filetime::set_file_mtime(path, FileTime::from_system_time(time))
    }

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<S: Storage + ?Sized> Storage for &S {
    fn stat(&self, path: &Path) -> io::Result<SystemTime> {
        (**self).stat(path)
    }

    fn create_exclusive(&self, path: &Path) -> io::Result<()> {
        (**self).create_exclusive(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        (**self).remove(path)
    }

    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
        (**self).set_modified(path, time)
    }

    fn now(&self) -> SystemTime {
        (**self).now()
    }
}
