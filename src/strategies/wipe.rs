use std::time::Instant;

use tracing::info;

use crate::cleaner::{CleanContext, Cleaner, CleanupResult, Location};
use crate::utils;

/// Empties the location's directory completely.
pub struct Wipe;

impl Cleaner for Wipe {
    fn name(&self) -> &'static str {
        "wipe"
    }

    fn label(&self) -> &'static str {
        "Full wipe"
    }

    fn clean(&self, location: &Location, _ctx: &CleanContext<'_>) -> CleanupResult {
        let start = Instant::now();
        let Some(root) = location.target.dir() else {
            return CleanupResult::failed(
                &location.name,
                format!("{} is not a directory target", location.target),
                start.elapsed(),
            );
        };

        match utils::probe_dir(root) {
            Ok(true) => {}
            Ok(false) => return CleanupResult::directory_missing(&location.name, start.elapsed()),
            Err(e) => return CleanupResult::failed(&location.name, e.to_string(), start.elapsed()),
        }

        let stats = utils::wipe_dir(root);
        info!(
            "{}: deleted {} files ({}), skipped {}",
            location.key,
            stats.files_deleted,
            utils::format_size(stats.bytes_freed),
            stats.files_skipped
        );
        CleanupResult::succeeded(
            &location.name,
            stats.files_deleted,
            stats.bytes_freed,
            start.elapsed(),
        )
    }
}
