//! Timer-driven polling.
//!
//! Runs a background task that triggers a full [`Pipeline`] pass right away
//! and then once per interval.
//!
//! ## For contributors
//!
//! The poller loops forever: it runs one pass, then waits for the next
//! tick.  Per-feed logging happens inside the pipeline.  Feeds inside a pass are
//! processed sequentially by the pipeline itself.  If a pass outlasts the
//! interval the next tick is delayed rather than fired in a burst.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::pipeline::Pipeline;

/// Spawn the background polling task.
///
/// The task runs until it is aborted through the returned handle.
pub fn spawn(pipeline: Arc<Pipeline>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = every.as_secs(), "poller started");

        let mut timer = interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            let report = pipeline.run().await;
            debug!(
                outcomes = report.outcomes.len(),
                failures = report.failures.len(),
                "scheduled pass done"
            );
        }
    })
}
