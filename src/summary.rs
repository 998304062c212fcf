//! Read-only views derived from catalog state and cleanup results.
//! Recomputed on every call.

use std::time::Duration;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::cleaner::CleanupResult;

pub use crate::disk_info::{volume_report, VolumeSpace};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub locations: Vec<String>,
    pub total_bytes: u64,
    pub total_files: u64,
    pub enabled_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    /// In order of first appearance in the catalog.
    pub categories: Vec<CategorySummary>,
    pub total_bytes: u64,
    pub total_files: u64,
    pub total_locations: usize,
}

pub fn summarize(catalog: &Catalog) -> CleanupSummary {
    let mut categories: Vec<CategorySummary> = Vec::new();

    for location in catalog.all() {
        let idx = match categories.iter().position(|c| c.category == location.category) {
            Some(i) => i,
            None => {
                categories.push(CategorySummary {
                    category: location.category.clone(),
                    locations: Vec::new(),
                    total_bytes: 0,
                    total_files: 0,
                    enabled_count: 0,
                });
                categories.len() - 1
            }
        };
        let summary = &mut categories[idx];
        summary.locations.push(location.key.clone());
        summary.total_bytes += location.size_bytes;
        summary.total_files += location.file_count;
        if location.enabled {
            summary.enabled_count += 1;
        }
    }

    CleanupSummary {
        categories,
        total_bytes: catalog.total_bytes(),
        total_files: catalog.total_files(),
        total_locations: catalog.len(),
    }
}

/// Totals over one batch of cleanup results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Files and bytes from successful results only.
    pub files_deleted: u64,
    pub bytes_freed: u64,
    pub duration: Duration,
}

pub fn fold_results(results: &[CleanupResult]) -> CleanupReport {
    results.iter().fold(CleanupReport::default(), |mut report, r| {
        if r.success {
            report.succeeded += 1;
            report.files_deleted += r.files_deleted;
            report.bytes_freed += r.bytes_freed;
        } else {
            report.failed += 1;
        }
        report.duration += r.duration;
        report
    })
}
