use colored::Colorize;

use reclaim::cleaner::{CleanupResult, Location};
use reclaim::summary::{CategorySummary, CleanupReport, VolumeSpace};
use reclaim::utils::{estimate_cleanup_time, format_size};

pub fn print_banner() {
    println!(
        "{}",
        concat!("reclaim - disk cleanup v", env!("CARGO_PKG_VERSION"))
            .bold()
            .cyan()
    );
    println!();
}

pub fn print_location(location: &Location, scanned: bool) {
    let mut flags = Vec::new();
    if location.requires_admin {
        flags.push("admin");
    }
    if !location.safe_to_delete {
        flags.push("confirm");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!("[{}]", flags.join(", "))
    };

    if scanned {
        println!(
            "  {:<24} {:>12} {:>8} files  {}",
            location.key,
            format_size(location.size_bytes).yellow(),
            location.file_count,
            flags.dimmed()
        );
    } else {
        println!(
            "  {:<24} {}  {}",
            location.key,
            location.target.to_string().dimmed(),
            flags.dimmed()
        );
    }
}

pub fn print_category(summary: &CategorySummary) {
    println!("{}", format!("=== {} ===", summary.category).bold().white());
    println!(
        "  {} {}  ({} files, {} of {} enabled)",
        "Total:".bold(),
        format_size(summary.total_bytes).green(),
        summary.total_files,
        summary.enabled_count,
        summary.locations.len()
    );
    println!();
}

pub fn print_scan_header(label: &str) {
    println!("{}", format!("=== {label} ===").bold().white());
}

pub fn print_grand_total(total_bytes: u64, total_files: u64) {
    println!(
        "  {:<30} {}",
        "Total reclaimable:".bold(),
        format_size(total_bytes).green().bold()
    );
    println!(
        "  {:<30} {}",
        "Estimated cleanup time:",
        estimate_cleanup_time(total_files)
    );
    println!();
}

pub fn print_progress(index: usize, total: usize, message: &str) {
    println!("{} {}", format!("[{index}/{total}]").dimmed(), message);
}

pub fn print_result(result: &CleanupResult) {
    if result.success {
        let note = if result.error_message.is_empty() {
            String::new()
        } else {
            format!("  ({})", result.error_message)
        };
        println!(
            "  {} {:<28} {} files, {}{}",
            "Cleaned".green(),
            result.location_name,
            result.files_deleted,
            format_size(result.bytes_freed).yellow(),
            note.dimmed()
        );
    } else {
        println!(
            "  {} {:<28} {}",
            "Failed".red().bold(),
            result.location_name,
            result.error_message.red()
        );
    }
}

pub fn print_report(report: &CleanupReport) {
    println!();
    println!(
        "{} {}",
        "Cleaned!".green().bold(),
        format!("{} freed.", format_size(report.bytes_freed)).green()
    );
    println!(
        "  {} succeeded, {} failed, {} files deleted in {:.1}s",
        report.succeeded,
        report.failed,
        report.files_deleted,
        report.duration.as_secs_f64()
    );
}

pub fn print_volume(volume: &VolumeSpace) {
    println!(
        "  {:<20} {} free of {}  ({:.1}% used)",
        volume.mount_point.display(),
        format_size(volume.free_bytes).green(),
        format_size(volume.total_bytes),
        volume.used_percent
    );
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "Warning:".red().bold(), msg.red());
}

pub fn print_dry_run_footer() {
    println!(
        "{}",
        "This was a dry run. Run `reclaim clean --confirm` to delete."
            .yellow()
            .bold()
    );
}
