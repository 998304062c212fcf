use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::cleaner::{panic_message, Location, Target};
use crate::disk_info;
use crate::utils;

/// Totals over the locations measured by one scan call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanTotals {
    pub total_bytes: u64,
    pub total_files: u64,
    pub locations: usize,
}

/// Measures locations on a fixed-size worker pool.
pub struct Scanner {
    pool: rayon::ThreadPool,
    volume_roots: Vec<PathBuf>,
}

impl Scanner {
    /// Scanner over the fixed volumes currently mounted.
    pub fn new(workers: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        Self::with_volume_roots(workers, disk_info::fixed_volumes())
    }

    pub fn with_volume_roots(
        workers: usize,
        volume_roots: Vec<PathBuf>,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("reclaim-scan-{i}"))
            .build()?;
        Ok(Self { pool, volume_roots })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn volume_roots(&self) -> &[PathBuf] {
        &self.volume_roots
    }

    /// Scan every location in the catalog.
    ///
    /// `progress(completed, total)` is called once per finished location,
    /// with `completed` going 1, 2, .. `total`.
    pub fn scan<F>(&self, catalog: &mut Catalog, progress: F) -> ScanTotals
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        self.scan_where(catalog, |_| true, measure_target, progress)
    }

    /// Scan only the given keys; unknown keys are ignored. The returned
    /// totals cover just those locations.
    pub fn scan_keys<F>(&self, catalog: &mut Catalog, keys: &[&str], progress: F) -> ScanTotals
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        self.scan_where(
            catalog,
            |loc| keys.contains(&loc.key.as_str()),
            measure_target,
            progress,
        )
    }

    fn scan_where<P, M, F>(
        &self,
        catalog: &mut Catalog,
        wanted: P,
        measure_fn: M,
        progress: F,
    ) -> ScanTotals
    where
        P: Fn(&Location) -> bool,
        M: Fn(&Location, &[PathBuf]) -> (u64, u64) + Sync,
        F: Fn(usize, usize) + Send + Sync,
    {
        let targets: Vec<&mut Location> = catalog
            .all_mut()
            .iter_mut()
            .filter(|loc| wanted(loc))
            .collect();
        let total = targets.len();
        let totals = Mutex::new(ScanTotals::default());
        let roots = &self.volume_roots;

        self.pool.install(|| {
            targets.into_par_iter().for_each(|location| {
                let (bytes, files) = measure(location, roots, &measure_fn);
                location.size_bytes = bytes;
                location.file_count = files;
                info!(
                    "scanned {}: {} files, {}",
                    location.key,
                    files,
                    utils::format_size(bytes)
                );

                // Held across the callback so completions are reported in order.
                let mut done = totals.lock().unwrap_or_else(PoisonError::into_inner);
                done.total_bytes += bytes;
                done.total_files += files;
                done.locations += 1;
                progress(done.locations, total);
            });
        });

        totals.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

fn measure_target(location: &Location, volume_roots: &[PathBuf]) -> (u64, u64) {
    match &location.target {
        Target::Dir(path) => utils::dir_stats(path),
        Target::RecycleBin => utils::recycle_bin_stats(volume_roots),
    }
}

/// Size and file count of one location. Never fails; a location whose
/// measurement panics measures as empty.
fn measure<M>(location: &Location, volume_roots: &[PathBuf], measure_fn: &M) -> (u64, u64)
where
    M: Fn(&Location, &[PathBuf]) -> (u64, u64),
{
    let measured = panic::catch_unwind(AssertUnwindSafe(|| measure_fn(location, volume_roots)));
    measured.unwrap_or_else(|payload| {
        warn!("scan of {} failed: {}", location.key, panic_message(payload));
        (0, 0)
    })
}
