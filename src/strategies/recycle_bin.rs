use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::cleaner::{CleanContext, Cleaner, CleanupResult, Location};
use crate::command;
use crate::utils;

/// Empties the recycle bin through the OS instead of deleting its files.
///
/// The OS call reports no counts, so the bin is measured right before the
/// call and that measurement is reported as freed.
pub struct RecycleBin {
    pub timeout: Duration,
}

impl Cleaner for RecycleBin {
    fn name(&self) -> &'static str {
        "recycle-bin"
    }

    fn label(&self) -> &'static str {
        "Empty via OS"
    }

    fn clean(&self, location: &Location, ctx: &CleanContext<'_>) -> CleanupResult {
        let start = Instant::now();
        let (bytes, files) = utils::recycle_bin_stats(ctx.volume_roots);

        match command::run_checked(
            ctx.runner,
            &command::empty_recycle_bin(),
            self.timeout,
            "Failed to empty Recycle Bin",
        ) {
            Ok(_) => {
                info!("{}: emptied {} files ({})", location.key, files, utils::format_size(bytes));
                CleanupResult::succeeded(&location.name, files, bytes, start.elapsed())
            }
            Err(e) => {
                warn!("{}: {e}", location.key);
                CleanupResult::failed(&location.name, e.to_string(), start.elapsed())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::Target;
    use crate::command::CommandOutput;
    use crate::strategies::testing::Recorder;
    use std::fs;

    fn bin() -> Location {
        Location::new("recycle_bin", "Recycle Bin", Target::RecycleBin, "Recycle Bin")
    }

    #[test]
    fn reports_pre_empty_measurement() {
        let volume = tempfile::tempdir().unwrap();
        let dir = volume.path().join(utils::RECYCLE_BIN_DIR);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("$Rabc.doc"), [0u8; 64]).unwrap();
        fs::write(dir.join("$Iabc.doc"), [0u8; 16]).unwrap();

        let recorder = Recorder::default();
        let roots = vec![volume.path().to_path_buf()];
        let ctx = CleanContext {
            runner: &recorder,
            volume_roots: &roots,
        };
        let result = RecycleBin { timeout: Duration::from_secs(60) }.clean(&bin(), &ctx);

        assert!(result.success);
        assert_eq!(result.files_deleted, 2);
        assert_eq!(result.bytes_freed, 80);
        assert_eq!(recorder.programs(), vec!["powershell"]);
    }

    #[test]
    fn command_failure_surfaces_stderr() {
        let recorder = Recorder::failing_with(CommandOutput {
            exit_code: Some(1),
            stderr: "Access is denied.".to_string(),
            ..Default::default()
        });
        let ctx = CleanContext {
            runner: &recorder,
            volume_roots: &[],
        };
        let result = RecycleBin { timeout: Duration::from_secs(60) }.clean(&bin(), &ctx);

        assert!(!result.success);
        assert_eq!(result.error_message, "Access is denied.");
        assert_eq!((result.files_deleted, result.bytes_freed), (0, 0));
    }
}
