use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::cleaner::{panic_message, CleanContext, CleanupResult};
use crate::command::CommandRunner;

/// Applies each location's strategy, one location at a time.
///
/// Holds no state between calls; totals are folded by the caller from the
/// returned results.
pub struct Executor<'a> {
    runner: &'a dyn CommandRunner,
    volume_roots: Vec<PathBuf>,
}

impl<'a> Executor<'a> {
    pub fn new(runner: &'a dyn CommandRunner, volume_roots: Vec<PathBuf>) -> Self {
        Self {
            runner,
            volume_roots,
        }
    }

    /// Clean one location. An unknown key or a panicking strategy becomes a
    /// failed result.
    pub fn clean_one(&self, catalog: &Catalog, key: &str) -> CleanupResult {
        let Some((location, cleaner)) = catalog.entry(key) else {
            warn!("{key}: not in catalog");
            return CleanupResult::not_found(key);
        };

        let ctx = CleanContext {
            runner: self.runner,
            volume_roots: &self.volume_roots,
        };
        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| cleaner.clean(location, &ctx)))
            .unwrap_or_else(|payload| {
                CleanupResult::failed(&location.name, panic_message(payload), start.elapsed())
            });

        if result.success {
            info!("{key}: {} ({})", cleaner.label(), result.location_name);
        } else {
            warn!("{key}: {}", result.error_message);
        }
        result
    }

    /// Clean the given keys in order, one result per key.
    ///
    /// `progress(index, total, message)` fires before each location and once
    /// more with `index == total` at the end.
    pub fn clean<F>(&self, catalog: &Catalog, keys: &[&str], mut progress: F) -> Vec<CleanupResult>
    where
        F: FnMut(usize, usize, &str),
    {
        let total = keys.len();
        let mut results = Vec::with_capacity(total);

        for (i, key) in keys.iter().enumerate() {
            progress(i, total, &format!("Cleaning {key}..."));
            results.push(self.clean_one(catalog, key));
        }
        progress(total, total, "Cleanup completed");

        results
    }
}
