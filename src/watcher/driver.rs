//! Async host loop for a [`ConfigWatcher`].

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::{ConfigWatcher, TickOutcome};

/// Tick `watcher` every `tick_every` until `shutdown` is cancelled, then
/// stop it and hand it back.
///
/// All ticks run on this one task, so reconciles never overlap.
pub async fn drive(
    mut watcher: ConfigWatcher,
    tick_every: Duration,
    shutdown: CancellationToken,
) -> ConfigWatcher {
    let mut ticker = interval(tick_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                match watcher.tick() {
                    TickOutcome::Inactive => {
                        crate::debug_event!("driver", "watcher inactive, exiting");
                        break;
                    }
                    TickOutcome::Reloaded(report) if !report.is_empty() => {
                        crate::debug_event!("driver", "reloaded", "{}", report.summary());
                    }
                    TickOutcome::ReloadFailed { reason } => {
                        crate::debug_event!("driver", "reload failed", "{reason}");
                    }
                    _ => {}
                }
            }
        }
    }

    watcher.stop();
    watcher
}
