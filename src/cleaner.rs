use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::command::CommandRunner;

pub const LOCATION_NOT_FOUND: &str = "Location not found";
pub const DIRECTORY_MISSING: &str = "Directory does not exist";

/// Where a location lives on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Target {
    Dir(PathBuf),
    /// The per-volume recycle bins, taken together.
    RecycleBin,
}

impl Target {
    pub fn dir(&self) -> Option<&Path> {
        match self {
            Target::Dir(path) => Some(path),
            Target::RecycleBin => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Dir(path) => write!(f, "{}", path.display()),
            Target::RecycleBin => f.write_str(crate::utils::RECYCLE_BIN_DIR),
        }
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.to_string()
    }
}

/// One catalogued cleanup target.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub key: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "path")]
    pub target: Target,
    pub category: String,
    /// Filled in by the scanner; 0 until the first scan.
    pub size_bytes: u64,
    pub file_count: u64,
    pub enabled: bool,
    pub requires_admin: bool,
    pub safe_to_delete: bool,
}

impl Location {
    pub fn new(key: &str, name: &str, target: Target, category: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            description: String::new(),
            target,
            category: category.to_string(),
            size_bytes: 0,
            file_count: 0,
            enabled: true,
            requires_admin: false,
            safe_to_delete: true,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn admin(mut self) -> Self {
        self.requires_admin = true;
        self
    }

    /// Mark as needing operator confirmation. Advisory only.
    pub fn confirm_first(mut self) -> Self {
        self.safe_to_delete = false;
        self
    }
}

/// Outcome of cleaning one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupResult {
    pub location_name: String,
    pub success: bool,
    pub files_deleted: u64,
    pub bytes_freed: u64,
    /// Empty unless there is something to report.
    pub error_message: String,
    pub duration: Duration,
}

impl CleanupResult {
    pub fn succeeded(name: &str, files_deleted: u64, bytes_freed: u64, duration: Duration) -> Self {
        Self {
            location_name: name.to_string(),
            success: true,
            files_deleted,
            bytes_freed,
            error_message: String::new(),
            duration,
        }
    }

    pub fn failed(name: &str, message: impl Into<String>, duration: Duration) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "Cleanup failed".to_string();
        }
        Self {
            location_name: name.to_string(),
            success: false,
            files_deleted: 0,
            bytes_freed: 0,
            error_message: message,
            duration,
        }
    }

    /// Nothing to do: the target was never there or is already gone.
    pub fn directory_missing(name: &str, duration: Duration) -> Self {
        Self {
            error_message: DIRECTORY_MISSING.to_string(),
            ..Self::succeeded(name, 0, 0, duration)
        }
    }

    pub fn not_found(key: &str) -> Self {
        Self::failed(key, LOCATION_NOT_FOUND, Duration::ZERO)
    }
}

/// What a strategy may use besides the location itself.
pub struct CleanContext<'a> {
    pub runner: &'a dyn CommandRunner,
    /// Root of every fixed volume, for targets spread across volumes.
    pub volume_roots: &'a [PathBuf],
}

/// The trait every retention strategy implements.
///
/// `clean` never fails outward: every error ends up in the returned result.
pub trait Cleaner: Send + Sync {
    /// Machine-readable strategy name (e.g. "wipe").
    fn name(&self) -> &'static str;

    /// Human-readable label for display.
    fn label(&self) -> &'static str;

    fn clean(&self, location: &Location, ctx: &CleanContext<'_>) -> CleanupResult;
}

/// Text of a caught panic payload.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "cleanup panicked".to_string()
    }
}
