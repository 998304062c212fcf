// Cleanup engine: location catalog, concurrent size scanner, per-location
// retention strategies and a sequential executor.

pub mod catalog;
pub mod cleaner;
pub mod command;
pub mod config;
pub mod disk_info;
pub mod error;
pub mod executor;
pub mod scanner;
pub mod strategies;
pub mod summary;
pub mod utils;

pub use catalog::{Catalog, PlatformRoots, TEMP_KEYS};
pub use cleaner::{CleanContext, Cleaner, CleanupResult, Location, Target};
pub use command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use config::Config;
pub use error::{CleanError, ConfigError};
pub use executor::Executor;
pub use scanner::{ScanTotals, Scanner};
pub use summary::{fold_results, summarize, CleanupReport, CleanupSummary};
