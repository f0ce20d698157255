//! Best-effort removal of leftover output files.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

/// Outcome of one sweep over the cache roots.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Files deleted.
    pub removed: usize,
    /// Matching files that could not be deleted.
    pub failed: usize,
}

/// Delete every regular file whose name starts with `prefix` in each root.
///
/// Missing or unreadable roots are skipped, and per-file failures are
/// counted but otherwise ignored. Subdirectories are never touched. An
/// empty prefix matches nothing.
pub fn sweep_directories<'a, I>(roots: I, prefix: &str) -> SweepReport
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut report = SweepReport::default();
    if prefix.is_empty() {
        warn!("refusing to sweep cache roots with an empty prefix");
        return report;
    }

    for root in roots {
        sweep_directory(root, prefix, &mut report);
    }

    info!(
        removed = report.removed,
        failed = report.failed,
        "swept rotated image cache"
    );
    report
}

fn sweep_directory(dir: &Path, prefix: &str, report: &mut SweepReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping cache root");
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(prefix) {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "could not remove cached file");
                report.failed += 1;
            }
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
