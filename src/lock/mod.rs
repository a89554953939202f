mod guard;
mod locker;
mod path;
mod storage;

pub use guard::LockGuard;
pub(crate) use locker::Reclaim;
pub use locker::{LockStatus, Locker, MarkerNamer, DEFAULT_LEASE, DEFAULT_SUFFIX};
pub use path::{
    append_suffix, cache_dir_namer, default_cache_dir, hashed_marker_path, validate_marker_path,
};
pub use storage::{FsStorage, Storage};
