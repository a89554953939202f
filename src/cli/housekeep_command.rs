use crate::cli::MarkerArgs;
use leaselock::housekeep::{sweep_expired, SweepConfig};
use leaselock::lock::default_cache_dir;
use leaselock::{Locker, Result};
use std::path::PathBuf;

pub fn execute_housekeep(
    locker: &Locker,
    marker: &MarkerArgs,
    dir: Option<PathBuf>,
    recursive: bool,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let target_dir = match dir {
        Some(dir) => dir,
        None if marker.cache_dir => default_cache_dir()?,
        None => PathBuf::from("."),
    };

    let config = SweepConfig {
        dir: target_dir,
        recursive,
        suffix: marker.suffix.clone(),
        dry_run,
    };

    let swept = sweep_expired(locker, &config)?;

    if !quiet {
        for path in &swept {
            println!(
                "{}{}",
                if dry_run {
                    "[DRY RUN] Would delete: "
                } else {
                    "Deleted: "
                },
                path.display()
            );
        }
    }

    if dry_run && !quiet {
        eprintln!("Found {} expired lock file(s)", swept.len());
    }

    Ok(())
}
