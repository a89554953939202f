mod types;

pub use types::{LockError, Result, StorageOp};

// Re-export for convenience
pub use LockError as Error;
