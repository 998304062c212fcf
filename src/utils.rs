use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::CleanError;

/// Name of the per-volume recycle bin directory.
pub const RECYCLE_BIN_DIR: &str = "$Recycle.Bin";

/// Total size and file count of a directory tree.
///
/// Every non-directory entry counts as a file. Entries that cannot be read
/// (permission denied, removed mid-walk) are left out of both totals. A
/// missing path, or anything at the path that is not a directory, is
/// `(0, 0)`, matching what a cleanup of that path would do.
pub fn dir_stats(path: &Path) -> (u64, u64) {
    match probe_dir(path) {
        Ok(true) => {}
        Ok(false) => return (0, 0),
        Err(e) => {
            debug!("not scanning {}: {e}", path.display());
            return (0, 0);
        }
    }

    let mut bytes = 0u64;
    let mut files = 0u64;

    for entry in WalkDir::new(path).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("skipping unreadable entry under {}: {e}", path.display());
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        match entry.metadata() {
            Ok(meta) => {
                bytes += meta.len();
                files += 1;
            }
            Err(e) => debug!("skipping {}: {e}", entry.path().display()),
        }
    }

    (bytes, files)
}

/// Recycle bin size summed over every volume root.
pub fn recycle_bin_stats(volume_roots: &[PathBuf]) -> (u64, u64) {
    volume_roots
        .iter()
        .map(|root| dir_stats(&root.join(RECYCLE_BIN_DIR)))
        .fold((0, 0), |(b, f), (rb, rf)| (b + rb, f + rf))
}

/// `Ok(false)` when the path does not exist, `Ok(true)` for a directory.
/// Anything else at that path is an error.
pub fn probe_dir(path: &Path) -> Result<bool, CleanError> {
    match path.symlink_metadata() {
        Ok(meta) if meta.is_dir() => Ok(true),
        Ok(_) => Err(CleanError::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CleanError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WipeStats {
    pub files_deleted: u64,
    pub bytes_freed: u64,
    pub files_skipped: u64,
}

/// Delete everything below `root`, keeping `root` itself.
///
/// Files go first, deepest first; each file is measured right before it is
/// removed. Directories are removed in a second bottom-up pass and only
/// succeed once empty, so a directory still holding a locked file stays.
pub fn wipe_dir(root: &Path) -> WipeStats {
    let mut stats = WipeStats::default();
    let mut dirs = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .contents_first(true)
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };

        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!("skipping {}: {e}", entry.path().display());
                stats.files_skipped += 1;
                continue;
            }
        };
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                stats.files_deleted += 1;
                stats.bytes_freed += size;
            }
            Err(e) => {
                debug!("cannot delete {}: {e}", entry.path().display());
                stats.files_skipped += 1;
            }
        }
    }

    // contents_first yields children before parents
    for dir in dirs {
        if let Err(e) = std::fs::remove_dir(&dir) {
            debug!("keeping directory {}: {e}", dir.display());
        }
    }

    stats
}

/// Format byte count as human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1_024 {
        format!("{:.2} KB", bytes as f64 / 1_024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Rough wall-clock estimate for deleting `total_files` files.
pub fn estimate_cleanup_time(total_files: u64) -> &'static str {
    match total_files {
        0..=999 => "Less than 1 minute",
        1_000..=9_999 => "1-3 minutes",
        10_000..=49_999 => "3-10 minutes",
        _ => "10+ minutes",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn dir_stats_counts_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("one"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("a/two"), vec![0u8; 200]).unwrap();
        fs::write(dir.path().join("a/b/three"), vec![0u8; 300]).unwrap();

        assert_eq!(dir_stats(dir.path()), (600, 3));
    }

    #[test]
    fn dir_stats_of_missing_path_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(dir_stats(&dir.path().join("gone")), (0, 0));
    }

    #[test]
    fn recycle_bin_stats_sums_volumes() {
        let c = tempfile::tempdir().unwrap();
        let d = tempfile::tempdir().unwrap();
        let e = tempfile::tempdir().unwrap();
        fs::create_dir_all(c.path().join(RECYCLE_BIN_DIR).join("S-1-5")).unwrap();
        fs::create_dir_all(d.path().join(RECYCLE_BIN_DIR)).unwrap();
        fs::write(c.path().join(RECYCLE_BIN_DIR).join("S-1-5/$R1.txt"), [1u8; 10]).unwrap();
        fs::write(d.path().join(RECYCLE_BIN_DIR).join("$R2.txt"), [1u8; 5]).unwrap();

        let roots: Vec<PathBuf> = vec![c.path().into(), d.path().into(), e.path().into()];
        assert_eq!(recycle_bin_stats(&roots), (15, 2));
    }

    #[test]
    fn wipe_keeps_root_and_removes_empty_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x/y/z")).unwrap();
        fs::write(dir.path().join("x/y/z/f"), [0u8; 7]).unwrap();
        fs::write(dir.path().join("g"), [0u8; 3]).unwrap();

        let stats = wipe_dir(dir.path());
        assert_eq!(stats.files_deleted, 2);
        assert_eq!(stats.bytes_freed, 10);
        assert_eq!(stats.files_skipped, 0);
        assert!(dir.path().is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn probe_dir_states() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();

        assert!(probe_dir(dir.path()).unwrap());
        assert!(!probe_dir(&dir.path().join("missing")).unwrap());
        assert!(matches!(probe_dir(&file), Err(CleanError::NotADirectory(_))));
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1_048_576), "3.00 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
    }

    #[test]
    fn cleanup_time_buckets() {
        assert_eq!(estimate_cleanup_time(0), "Less than 1 minute");
        assert_eq!(estimate_cleanup_time(1_000), "1-3 minutes");
        assert_eq!(estimate_cleanup_time(49_999), "3-10 minutes");
        assert_eq!(estimate_cleanup_time(50_000), "10+ minutes");
    }

    #[test]
    fn dir_stats_of_a_plain_file_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pagefile");
        fs::write(&file, [0u8; 64]).unwrap();
        assert_eq!(dir_stats(&file), (0, 0));
    }

    #[cfg(unix)]
    fn running_as_root() -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(unix)]
    fn set_mode(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn dir_stats_skips_unreadable_subtrees() {
        if running_as_root() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(locked.join("inner")).unwrap();
        fs::write(locked.join("hidden"), [0u8; 1000]).unwrap();
        fs::write(dir.path().join("a"), [0u8; 10]).unwrap();
        fs::create_dir(dir.path().join("z")).unwrap();
        fs::write(dir.path().join("z/b"), [0u8; 20]).unwrap();
        set_mode(&locked, 0o000);

        let stats = dir_stats(dir.path());
        set_mode(&locked, 0o755);
        assert_eq!(stats, (30, 2));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_does_not_stop_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("link")).unwrap();
        fs::write(dir.path().join("real"), [0u8; 50]).unwrap();

        let (bytes, files) = dir_stats(dir.path());
        assert_eq!(files, 2);
        assert!(bytes >= 50);

        let stats = wipe_dir(dir.path());
        assert_eq!(stats.files_deleted, 2);
        assert_eq!(stats.bytes_freed, bytes);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn wipe_skips_undeletable_files_and_keeps_their_parent() {
        if running_as_root() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let sealed = dir.path().join("sealed");
        fs::create_dir(&sealed).unwrap();
        fs::write(sealed.join("in-use.log"), [0u8; 70]).unwrap();
        fs::create_dir(dir.path().join("open")).unwrap();
        fs::write(dir.path().join("open/a"), [0u8; 5]).unwrap();
        fs::write(dir.path().join("b"), [0u8; 6]).unwrap();
        set_mode(&sealed, 0o500);

        let stats = wipe_dir(dir.path());
        set_mode(&sealed, 0o755);

        assert_eq!(stats.files_deleted, 2);
        assert_eq!(stats.bytes_freed, 11);
        assert_eq!(stats.files_skipped, 1);
        assert!(sealed.join("in-use.log").exists());
        assert!(!dir.path().join("open").exists());
    }
}
