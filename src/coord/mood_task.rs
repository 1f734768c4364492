//! Mood coordinator task.
//!
//! Receives parameter snapshots from the render task, evaluates them with
//! [`mood::evaluate`] and sends the results back. Evaluation is cheap, but it
//! runs here so the render task never does more than a `try_receive`.

use std::sync::Arc;

use futures_lite::future;
use log::{debug, info};

use crate::app::ports::Clock;
use crate::diagnostics::CoordinatorStats;
use crate::mood::{self, MoodResult, ParameterSnapshot};

use super::channels::CoordLinks;

pub struct MoodTask<C> {
    clock: C,
    stats: Arc<CoordinatorStats>,
}

impl<C: Clock> MoodTask<C> {
    pub fn new(clock: C, stats: Arc<CoordinatorStats>) -> Self {
        Self { clock, stats }
    }

    /// Evaluate one snapshot against the current time.
    pub fn handle(&self, snapshot: &ParameterSnapshot) -> MoodResult {
        let result = mood::evaluate(snapshot, self.clock.now_secs());
        CoordinatorStats::bump(&self.stats.mood_evaluations);
        debug!(
            "MOOD: NH3={:.2} NO2={:.2} NO3={:.1} pH={:.1} -> total={} {} ({})",
            snapshot.ammonia_ppm,
            snapshot.nitrite_ppm,
            snapshot.nitrate_ppm,
            snapshot.ph,
            result.total,
            result.category.label(),
            result.reason
        );
        result
    }

    /// Task body. Never returns.
    ///
    /// A full result channel blocks this task, not the render task, until
    /// the next mood poll drains it.
    pub fn run(self, links: &CoordLinks) -> ! {
        info!("MOOD: coordinator started");
        loop {
            future::block_on(async {
                let snapshot = links.snapshots.receive().await;
                let result = self.handle(&snapshot);
                links.mood_results.send(result).await;
            });
        }
    }
}
