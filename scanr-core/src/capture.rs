//! Capture through an external scanning application.
//!
//! Some scanners only talk to their vendor's own program. This module covers
//! that path: launch the application, let the user drive it, and when it
//! exits pick up whatever it saved by taking the most recently modified file
//! in a watched directory.

use crate::error::{Result, ScanError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Runs `command`, waits for it to exit, and returns the newest file in
/// `watch_dir`.
///
/// The external application's exit status is not treated as authoritative
/// (many vendor tools report odd codes on a successful save), but its stderr
/// and a non-zero status are logged.
///
/// # Errors
///
/// Returns [`ScanError::Capture`] if the command cannot be spawned, the
/// directory cannot be read, or it contains no files after the application
/// exits.
pub fn run(command: &Path, watch_dir: &Path) -> Result<PathBuf> {
    let command_label = command.display().to_string();

    let output = Command::new(command)
        .output()
        .map_err(|e| ScanError::capture(&command_label, e.to_string()))?;

    if !output.stderr.is_empty() {
        warn!(
            command = %command_label,
            "external scanner reported: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    if !output.status.success() {
        warn!(command = %command_label, status = %output.status, "external scanner exited abnormally");
    }

    let entries = fs::read_dir(watch_dir).map_err(|e| {
        ScanError::capture(
            &command_label,
            format!("cannot read '{}': {e}", watch_dir.display()),
        )
    })?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }

    match newest {
        Some((_, path)) => {
            debug!(path = %path.display(), "picked up captured file");
            Ok(path)
        }
        None => Err(ScanError::capture(
            &command_label,
            format!("no files found in '{}'", watch_dir.display()),
        )),
    }
}
