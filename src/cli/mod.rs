mod args;
mod housekeep_command;
mod lock_command;

pub use args::{Args, Command, MarkerArgs};
use leaselock::lock::{cache_dir_namer, default_cache_dir, validate_marker_path};
use leaselock::utils::parse_duration;
use leaselock::{Locker, Result};
use std::path::Path;

pub fn run(args: Args) -> Result<()> {
    let locker = build_locker(&args.marker)?;

    match args.command {
        Command::Housekeep {
            dir,
            recursive,
            dry_run,
        } => housekeep_command::execute_housekeep(
            &locker,
            &args.marker,
            dir,
            recursive,
            dry_run,
            args.quiet,
        ),
        cmd => lock_command::execute_lock(&locker, &args.marker, cmd, args.quiet),
    }
}

fn build_locker(marker: &MarkerArgs) -> Result<Locker> {
    let locker = Locker::new().with_lease(parse_duration(&marker.lease)?);

    if let Some(path) = &marker.marker {
        let path = path.clone();
        return Ok(locker.with_namer(move |_| path.clone()));
    }

    if marker.cache_dir {
        return Ok(locker.with_namer(cache_dir_namer(default_cache_dir()?)));
    }

    Ok(locker.with_suffix(marker.suffix.clone()))
}

/// Check an explicit `--marker` against the resource it guards.
pub(crate) fn check_marker(marker: &MarkerArgs, locker: &Locker, resource: &Path) -> Result<()> {
    if marker.marker.is_some() {
        validate_marker_path(&locker.marker_path(resource), resource)?;
    }
    Ok(())
}
