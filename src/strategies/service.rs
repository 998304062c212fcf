use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::cleaner::{panic_message, CleanContext, Cleaner, CleanupResult, Location};
use crate::command;
use crate::strategies::Wipe;

/// Wipes a directory owned by a service, with the service stopped.
///
/// The service is started again whatever happened during the wipe. A stop
/// failure is logged and the wipe goes ahead, since the usual cause is that
/// the service was not running. A start failure fails the result.
pub struct ServiceWipe {
    pub service: String,
    pub timeout: Duration,
}

impl Cleaner for ServiceWipe {
    fn name(&self) -> &'static str {
        "service-wipe"
    }

    fn label(&self) -> &'static str {
        "Wipe with service stopped"
    }

    fn clean(&self, location: &Location, ctx: &CleanContext<'_>) -> CleanupResult {
        let start = Instant::now();

        if let Err(e) = command::run_checked(
            ctx.runner,
            &command::stop_service(&self.service),
            self.timeout,
            &format!("Failed to stop service {}", self.service),
        ) {
            warn!("{}: could not stop {}: {e}", location.key, self.service);
        }

        let wiped = panic::catch_unwind(AssertUnwindSafe(|| Wipe.clean(location, ctx)));

        let restarted = command::run_checked(
            ctx.runner,
            &command::start_service(&self.service),
            self.timeout,
            &format!("Failed to start service {}", self.service),
        );

        let mut result = match wiped {
            Ok(result) => result,
            Err(payload) => CleanupResult::failed(&location.name, panic_message(payload), Duration::ZERO),
        };
        if let Err(e) = restarted {
            warn!("{}: could not restart {}: {e}", location.key, self.service);
            if result.success {
                result.success = false;
                result.error_message = e.to_string();
            }
        }
        result.duration = start.elapsed();
        result
    }
}
