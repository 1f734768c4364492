//! Network coordinator task.
//!
//! Owns the connectivity probe, the remote advisory client and the telemetry
//! port. Runs on the I/O core where blocking on HTTP is acceptable.
//!
//! ```text
//!              request                     ┌──────────────────┐
//!  Idle ───────────────▶ network ready? ──no──▶ offline result  │
//!   ▲                          │ yes       └──────────────────┘
//!   │                          ▼
//!   │                   cooling down? ──yes──▶ "Resets in N seconds."
//!   │                          │ no / expired
//!   │                          ▼
//!   │                      InFlight ──429──▶ QuotaCooldown { until }
//!   └──── 2xx / other ─────────┘
//! ```
//!
//! Offline answers never touch quota state. Advisory requests are served
//! before telemetry when both are pending.

use std::sync::Arc;

use futures_lite::future;
use log::{debug, info, warn};

use crate::app::events::TelemetrySnapshot;
use crate::app::ports::{AdvisoryClient, Clock, Connectivity, TelemetryPort};
use crate::config::SystemConfig;
use crate::coord::channels::CoordLinks;
use crate::diagnostics::CoordinatorStats;
use crate::error::Error;

use super::quota::{self, QuotaCheck, QuotaLimits, QuotaState};
use super::{AdvisoryRequest, AdvisoryResult, OFFLINE_TEXT, prompt};

/// Externally visible state of the advisory coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryState {
    Idle,
    InFlight,
    QuotaCooldown { until: u64 },
}

enum Work {
    Advisory(AdvisoryRequest),
    Telemetry(TelemetrySnapshot),
}

pub struct NetTask<N, A, T, C> {
    net: N,
    client: A,
    telemetry: T,
    clock: C,
    quota: QuotaState,
    in_flight: bool,
    limits: QuotaLimits,
    stats: Arc<CoordinatorStats>,
}

impl<N, A, T, C> NetTask<N, A, T, C>
where
    N: Connectivity,
    A: AdvisoryClient,
    T: TelemetryPort,
    C: Clock,
{
    pub fn new(
        net: N,
        client: A,
        telemetry: T,
        clock: C,
        config: &SystemConfig,
        stats: Arc<CoordinatorStats>,
    ) -> Self {
        Self {
            net,
            client,
            telemetry,
            clock,
            quota: QuotaState::default(),
            in_flight: false,
            limits: QuotaLimits::from_config(config),
            stats,
        }
    }

    pub fn state(&self) -> AdvisoryState {
        if self.in_flight {
            AdvisoryState::InFlight
        } else if self.quota.exhausted {
            AdvisoryState::QuotaCooldown {
                until: self.quota.reset_at,
            }
        } else {
            AdvisoryState::Idle
        }
    }

    pub fn quota(&self) -> QuotaState {
        self.quota
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// Replace the cooldown settings. An active cooldown keeps its deadline;
    /// the next rate-limit answer uses the new values.
    pub fn set_limits(&mut self, limits: QuotaLimits) {
        if limits != self.limits {
            info!(
                "ADVISORY: quota cooldown now {}s, max {}s",
                limits.base_secs, limits.max_secs
            );
            self.limits = limits;
        }
    }

    /// Pick up limits published by the render task, if any.
    pub fn apply_pending_limits(&mut self, links: &CoordLinks) {
        if let Some(limits) = links.quota_limits.try_take() {
            self.set_limits(limits);
        }
    }

    /// Serve one advisory request. Never fails: every outcome is a result
    /// value for the display.
    pub fn handle_request(&mut self, request: &AdvisoryRequest) -> AdvisoryResult {
        if !self.net.is_network_ready() {
            warn!("ADVISORY: request received but network not ready, answering offline");
            CoordinatorStats::bump(&self.stats.offline_refusals);
            return AdvisoryResult::failure(OFFLINE_TEXT);
        }

        match self.quota.check(self.clock.now_secs()) {
            QuotaCheck::Cooling { remaining_secs } => {
                info!("ADVISORY: quota cooldown, {}s left, skipping remote call", remaining_secs);
                CoordinatorStats::bump(&self.stats.cooldown_refusals);
                return AdvisoryResult {
                    success: false,
                    text: quota::cooling_text(remaining_secs),
                };
            }
            QuotaCheck::Expired => info!("ADVISORY: quota cooldown expired, retrying remote"),
            QuotaCheck::Open => {}
        }

        let prompt = prompt::build(request);
        info!(
            "ADVISORY: querying remote (mood={}, {} byte prompt)",
            request.category.label(),
            prompt.len()
        );

        self.in_flight = true;
        CoordinatorStats::bump(&self.stats.advisory_calls);
        let outcome = self.client.query(prompt.as_str());
        self.in_flight = false;

        match outcome {
            Ok(resp) if (200..300).contains(&resp.status) && !resp.text.is_empty() => {
                if self.quota.strikes > 0 {
                    info!("ADVISORY: quota restored");
                }
                self.quota.on_success();
                info!("ADVISORY: success ({} chars)", resp.text.len());
                AdvisoryResult {
                    success: true,
                    text: resp.text,
                }
            }
            Ok(resp) if resp.status == 429 => {
                let delay = self.quota.on_rate_limited(
                    self.clock.now_secs(),
                    self.limits.base_secs,
                    self.limits.max_secs,
                );
                warn!(
                    "ADVISORY: quota exhausted (strike {}), no remote calls for {}s",
                    self.quota.strikes, delay
                );
                CoordinatorStats::bump(&self.stats.advisory_failures);
                AdvisoryResult {
                    success: false,
                    text: quota::exhausted_text(delay),
                }
            }
            Ok(resp) => {
                warn!("ADVISORY: remote answered HTTP {} with {} chars", resp.status, resp.text.len());
                CoordinatorStats::bump(&self.stats.advisory_failures);
                if (200..300).contains(&resp.status) {
                    AdvisoryResult::failure("AI response was empty.")
                } else {
                    let mut r = AdvisoryResult::failure("AI request failed (HTTP ");
                    let _ = core::fmt::Write::write_fmt(&mut r.text, format_args!("{}).", resp.status));
                    r
                }
            }
            Err(e) => {
                warn!("ADVISORY: remote call failed: {}", e);
                CoordinatorStats::bump(&self.stats.advisory_failures);
                let mut r = AdvisoryResult::failure("AI request failed: ");
                let _ = core::fmt::Write::write_fmt(&mut r.text, format_args!("{}.", e));
                r
            }
        }
    }

    /// Forward one dashboard snapshot. Skipped silently while offline.
    pub fn handle_telemetry(&mut self, snapshot: &TelemetrySnapshot) -> crate::error::Result<()> {
        if !self.net.is_network_ready() {
            debug!("TELEM: network not ready, snapshot dropped");
            return Ok(());
        }
        match self.telemetry.push(snapshot) {
            Ok(()) => {
                debug!("TELEM: snapshot pushed (mood={})", snapshot.mood.label());
                CoordinatorStats::bump(&self.stats.telemetry_pushes);
                Ok(())
            }
            Err(e) => {
                warn!("TELEM: push failed: {}", e);
                CoordinatorStats::bump(&self.stats.telemetry_failures);
                Err(Error::Telemetry(e))
            }
        }
    }

    /// Task body. Never returns.
    pub fn run(mut self, links: &CoordLinks) -> ! {
        info!(
            "ADVISORY: network task started (cooldown {}s, max {}s)",
            self.limits.base_secs, self.limits.max_secs
        );
        loop {
            let work = future::block_on(future::or(
                async { Work::Advisory(links.advisory_requests.wait().await) },
                async { Work::Telemetry(links.telemetry.wait().await) },
            ));
            self.apply_pending_limits(links);
            match work {
                Work::Advisory(request) => {
                    let result = self.handle_request(&request);
                    links.advisory_results.signal(result);
                }
                Work::Telemetry(snapshot) => {
                    // Failures are logged and counted in handle_telemetry.
                    let _ = self.handle_telemetry(&snapshot);
                }
            }
        }
    }
}
