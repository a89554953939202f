use filetime::FileTime;
use leaselock::{LockError, LockStatus, Locker};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn backdate(path: &Path, by: Duration) {
    let then = SystemTime::now() - by;
    filetime::set_file_mtime(path, FileTime::from_system_time(then)).unwrap();
}

#[test]
fn test_acquire_creates_marker_next_to_resource() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("data.txt");

    Locker::new().acquire(&resource).unwrap();

    assert!(temp.path().join("data.txt.lock").exists());
    assert!(!resource.exists(), "the resource itself is never touched");
}

#[test]
fn test_second_acquire_is_locked() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("data.txt");

    let first = Locker::new();
    let second = Locker::new();
    first.acquire(&resource).unwrap();

    let err = second.acquire(&resource).unwrap_err();
    assert!(matches!(err, LockError::Locked(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_release_then_reacquire() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("data.txt");
    let locker = Locker::new();

    locker.acquire(&resource).unwrap();
    locker.release(&resource).unwrap();
    assert!(!temp.path().join("data.txt.lock").exists());

    locker.acquire(&resource).unwrap();
}

#[test]
fn test_release_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("never-locked.txt");
    let locker = Locker::new();

    locker.release(&resource).unwrap();
    locker.release(&resource).unwrap();
}

#[test]
fn test_expired_marker_is_reclaimed() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("data.txt");
    let marker = temp.path().join("data.txt.lock");

    let holder = Locker::new().with_lease(Duration::from_secs(30));
    let other = Locker::new().with_lease(Duration::from_secs(30));
    holder.acquire(&resource).unwrap();
    backdate(&marker, Duration::from_secs(31));

    other.acquire(&resource).unwrap();

    // Fresh marker from the new holder
    let age = SystemTime::now()
        .duration_since(std::fs::metadata(&marker).unwrap().modified().unwrap())
        .unwrap_or_default();
    assert!(age < Duration::from_secs(5));
}

#[test]
fn test_default_lease_is_sixty_seconds() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("data.txt");
    let marker = temp.path().join("data.txt.lock");
    let locker = Locker::new();

    locker.acquire(&resource).unwrap();
    backdate(&marker, Duration::from_secs(50));
    assert!(locker.acquire(&resource).unwrap_err().is_locked());

    backdate(&marker, Duration::from_secs(61));
    locker.acquire(&resource).unwrap();
}

#[test]
fn test_renew_unlocked_is_not_locked() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("data.txt");

    let err = Locker::new().renew(&resource).unwrap_err();
    assert!(matches!(err, LockError::NotLocked(_)));
    assert!(!temp.path().join("data.txt.lock").exists());
}

#[test]
fn test_renew_does_not_resurrect_expired_lock() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("data.txt");
    let marker = temp.path().join("data.txt.lock");
    let locker = Locker::new().with_lease(Duration::from_secs(10));

    locker.acquire(&resource).unwrap();
    backdate(&marker, Duration::from_secs(10));

    assert!(locker.renew(&resource).unwrap_err().is_not_locked());
    assert!(!marker.exists(), "the stale marker is reclaimed");

    locker.acquire(&resource).unwrap();
}

#[test]
fn test_renew_extends_lease() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("data.txt");
    let marker = temp.path().join("data.txt.lock");
    let lease = Duration::from_millis(1000);
    let holder = Locker::new().with_lease(lease);
    let other = Locker::new().with_lease(lease);

    holder.acquire(&resource).unwrap();
    // Half the lease has passed
    backdate(&marker, lease / 2 + Duration::from_millis(100));
    holder.renew(&resource).unwrap();

    std::thread::sleep(lease / 2 + Duration::from_millis(100));

    assert!(
        other.acquire(&resource).unwrap_err().is_locked(),
        "renewed marker should still be live"
    );
}

#[test]
fn test_status_does_not_modify() {
    let temp = TempDir::new().unwrap();
    let resource = temp.path().join("data.txt");
    let marker = temp.path().join("data.txt.lock");
    let locker = Locker::new().with_lease(Duration::from_secs(10));

    assert_eq!(locker.status(&resource).unwrap(), LockStatus::Unlocked);

    locker.acquire(&resource).unwrap();
    assert!(locker.status(&resource).unwrap().is_held());

    backdate(&marker, Duration::from_secs(20));
    assert!(matches!(
        locker.status(&resource).unwrap(),
        LockStatus::Expired { age, .. } if age >= Duration::from_secs(19)
    ));
    assert!(marker.exists());
}

#[cfg(unix)]
#[test]
fn test_unwritable_directory_is_io_error() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("ro");
    std::fs::create_dir(&dir).unwrap();
    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();

    // Root ignores directory permissions
    let probe = dir.join("probe");
    if std::fs::write(&probe, b"").is_ok() {
        std::fs::remove_file(&probe).unwrap();
        return;
    }

    let err = Locker::new().acquire(dir.join("data.txt")).unwrap_err();
    assert!(matches!(
        err,
        LockError::Io {
            op: leaselock::StorageOp::Create,
            ..
        }
    ));
    assert_eq!(err.exit_code(), 1);

    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
}
