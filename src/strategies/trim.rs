use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use tracing::{debug, info};

use crate::cleaner::{CleanContext, Cleaner, CleanupResult, Location};
use crate::error::CleanError;
use crate::utils;

/// Keeps the `keep` most recently modified files and deletes the rest.
///
/// Only regular files directly inside the directory are eligible, narrowed
/// to one extension when `extension` is set. Ties on modification time are
/// broken by path so the kept set is deterministic.
pub struct TrimNewest {
    pub keep: usize,
    pub extension: Option<String>,
}

struct Candidate {
    path: PathBuf,
    modified: SystemTime,
    size: u64,
}

impl TrimNewest {
    fn is_eligible(&self, path: &Path) -> bool {
        match &self.extension {
            None => true,
            Some(want) => path
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(want))
                .unwrap_or(false),
        }
    }

    fn candidates(&self, root: &Path) -> Result<Vec<Candidate>, CleanError> {
        let read_dir = std::fs::read_dir(root).map_err(|source| CleanError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            if !self.is_eligible(&path) {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!("skipping {}: {e}", path.display());
                    continue;
                }
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push(Candidate {
                path,
                modified,
                size: meta.len(),
            });
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        Ok(files)
    }

    fn trim(&self, root: &Path) -> Result<(u64, u64), CleanError> {
        let files = self.candidates(root)?;
        let mut deleted = 0u64;
        let mut freed = 0u64;

        for file in files.iter().skip(self.keep) {
            match std::fs::remove_file(&file.path) {
                Ok(()) => {
                    deleted += 1;
                    freed += file.size;
                }
                Err(e) => debug!("cannot delete {}: {e}", file.path.display()),
            }
        }
        Ok((deleted, freed))
    }
}

impl Cleaner for TrimNewest {
    fn name(&self) -> &'static str {
        "trim"
    }

    fn label(&self) -> &'static str {
        "Keep newest"
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

        match self.trim(root) {
            Ok((deleted, freed)) => {
                info!(
                    "{}: trimmed {} files ({}), kept newest {}",
                    location.key,
                    deleted,
                    utils::format_size(freed),
                    self.keep
                );
                CleanupResult::succeeded(&location.name, deleted, freed, start.elapsed())
            }
            Err(e) => CleanupResult::failed(&location.name, e.to_string(), start.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::Target;
    use crate::strategies::testing::{context, Recorder};
    use std::collections::BTreeSet;
    use std::fs::{self, File};
    use std::time::Duration;

    fn write_aged(dir: &Path, name: &str, age_secs: u64) {
        let path = dir.join(name);
        fs::write(&path, [0u8; 10]).unwrap();
        let when = SystemTime::now() - Duration::from_secs(age_secs);
        File::options().write(true).open(&path).unwrap().set_modified(when).unwrap();
    }

    fn names(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn prefetch(dir: &Path) -> Location {
        Location::new("prefetch", "Prefetch Files", Target::Dir(dir.into()), "System Cache")
    }

    #[test]
    fn keeps_the_most_recent_files() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10u64 {
            write_aged(dir.path(), &format!("APP{i}.pf"), 100 * (i + 1));
        }
        write_aged(dir.path(), "Layout.ini", 100_000);

        let recorder = Recorder::default();
        let trim = TrimNewest {
            keep: 4,
            extension: Some("pf".to_string()),
        };
        let result = trim.clean(&prefetch(dir.path()), &context(&recorder));

        assert!(result.success);
        assert_eq!(result.files_deleted, 6);
        assert_eq!(result.bytes_freed, 60);
        let expected: BTreeSet<String> = ["APP0.pf", "APP1.pf", "APP2.pf", "APP3.pf", "Layout.ini"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names(dir.path()), expected);
    }

    #[test]
    fn fewer_files_than_keep_deletes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3u64 {
            write_aged(dir.path(), &format!("X{i}.pf"), i + 1);
        }

        let recorder = Recorder::default();
        let trim = TrimNewest {
            keep: 128,
            extension: Some("pf".to_string()),
        };
        let result = trim.clean(&prefetch(dir.path()), &context(&recorder));
        assert!(result.success);
        assert_eq!(result.files_deleted, 0);
        assert_eq!(names(dir.path()).len(), 3);
    }

    #[test]
    fn ties_break_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let when = SystemTime::now() - Duration::from_secs(500);
        for name in ["c.pf", "a.pf", "b.pf"] {
            let path = dir.path().join(name);
            fs::write(&path, "x").unwrap();
            File::options().write(true).open(&path).unwrap().set_modified(when).unwrap();
        }

        let trim = TrimNewest {
            keep: 2,
            extension: None,
        };
        trim.trim(dir.path()).unwrap();
        let expected: BTreeSet<String> = ["a.pf", "b.pf"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names(dir.path()), expected);
    }

    #[test]
    fn subdirectories_are_never_touched() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("ReadyBoot.pf")).unwrap();
        write_aged(dir.path(), "A.pf", 10);

        let trim = TrimNewest {
            keep: 0,
            extension: Some("pf".to_string()),
        };
        assert_eq!(trim.trim(dir.path()).unwrap(), (1, 10));
        assert!(dir.path().join("ReadyBoot.pf").is_dir());
    }

    #[test]
    fn missing_directory_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();
        let trim = TrimNewest {
            keep: 128,
            extension: None,
        };
        let result = trim.clean(&prefetch(&dir.path().join("Prefetch")), &context(&recorder));
        assert!(result.success);
        assert_eq!(result.files_deleted, 0);
    }
}
