use crate::cli::{check_marker, Command, MarkerArgs};
use chrono::{DateTime, Local};
use leaselock::{LockError, LockStatus, Locker, Result};
use std::path::Path;
use std::time::SystemTime;
use tracing::info;

pub fn execute_lock(locker: &Locker, marker: &MarkerArgs, cmd: Command, quiet: bool) -> Result<()> {
    match cmd {
        Command::Acquire { resource } => {
            check_marker(marker, locker, &resource)?;
            locker.acquire(&resource)?;
            info!("Acquired {}", resource.display());
            report(quiet, "acquired", locker, &resource);
        }
        Command::Release { resource } => {
            check_marker(marker, locker, &resource)?;
            locker.release(&resource)?;
            report(quiet, "released", locker, &resource);
        }
        Command::Renew { resource } => {
            check_marker(marker, locker, &resource)?;
            locker.renew(&resource)?;
            report(quiet, "renewed", locker, &resource);
        }
        Command::Status { resource } => print_status(locker, &resource)?,
        Command::Housekeep { .. } => {
            return Err(LockError::Other(
                "Internal error: expected a lock command".to_string(),
            ))
        }
    }
    Ok(())
}

fn report(quiet: bool, what: &str, locker: &Locker, resource: &Path) {
    if !quiet {
        println!(
            "{}: {} ({})",
            what,
            resource.display(),
            locker.marker_path(resource).display()
        );
    }
}

fn print_status(locker: &Locker, resource: &Path) -> Result<()> {
    let marker = locker.marker_path(resource);
    match locker.status(resource)? {
        LockStatus::Unlocked => {
            println!("unlocked: {}", resource.display());
        }
        LockStatus::Held {
            modified,
            remaining,
        } => {
            println!("locked: {}", resource.display());
            println!("  marker:   {}", marker.display());
            println!("  renewed:  {}", format_time(modified));
            println!("  expires in {:.1}s", remaining.as_secs_f64());
        }
        LockStatus::Expired { modified, age } => {
            println!("expired: {}", resource.display());
            println!("  marker:   {}", marker.display());
            println!("  renewed:  {}", format_time(modified));
            println!(
                "  overdue by {:.1}s",
                (age.saturating_sub(locker.lease())).as_secs_f64()
            );
        }
    }
    Ok(())
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
