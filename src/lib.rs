//! Advisory, time-bounded locks over named paths.
//!
//! A lock is a marker file next to (or derived from) the resource path. Its
//! existence means "locked" and its modification time is the start of the
//! current lease. Markers older than the lease are reclaimed by the next
//! acquirer. Every operation is non-blocking.
//!
//! ```no_run
//! use leaselock::Locker;
//! use std::time::Duration;
//!
//! let locker = Locker::new().with_lease(Duration::from_secs(30));
//! match locker.acquire("data/report.csv") {
//!     Ok(()) => {
//!         // ... work, calling locker.renew() before the lease runs out ...
//!         locker.release("data/report.csv")?;
//!     }
//!     Err(e) if e.is_locked() => eprintln!("busy, try later"),
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), leaselock::LockError>(())
//! ```

pub mod error;
pub mod housekeep;
pub mod lock;
pub mod utils;

pub use error::{LockError, Result, StorageOp};
pub use lock::{FsStorage, LockGuard, LockStatus, Locker, Storage};
