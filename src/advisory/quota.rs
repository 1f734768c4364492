//! Remote quota bookkeeping.
//!
//! A rate-limit answer puts the network task into a cooldown whose length
//! doubles with every consecutive rate-limit (`strikes`), capped at a
//! configured maximum. A successful answer clears everything.

use core::fmt::Write;

use super::AdviceText;
use crate::config::SystemConfig;

/// Cooldown settings applied to rate-limit answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub base_secs: u32,
    pub max_secs: u32,
}

impl QuotaLimits {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            base_secs: config.quota_cooldown_secs,
            max_secs: config.quota_cooldown_max_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaState {
    pub exhausted: bool,
    /// Seconds-since-boot deadline; meaningful only while `exhausted`.
    pub reset_at: u64,
    /// Consecutive rate-limit answers since the last success.
    pub strikes: u32,
}

/// Result of [`QuotaState::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaCheck {
    /// No cooldown active.
    Open,
    /// A cooldown just ran out; the call may proceed.
    Expired,
    /// Still cooling down.
    Cooling { remaining_secs: u64 },
}

impl QuotaState {
    /// Gate a request at `now`. Clears the cooldown once `now >= reset_at`.
    pub fn check(&mut self, now: u64) -> QuotaCheck {
        if !self.exhausted {
            return QuotaCheck::Open;
        }
        if now >= self.reset_at {
            self.exhausted = false;
            return QuotaCheck::Expired;
        }
        QuotaCheck::Cooling {
            remaining_secs: self.reset_at - now,
        }
    }

    /// Record a rate-limit answer at `now`; returns the cooldown length.
    pub fn on_rate_limited(&mut self, now: u64, base_secs: u32, max_secs: u32) -> u64 {
        self.strikes = self.strikes.saturating_add(1);
        let delay = cooldown_secs(self.strikes, base_secs, max_secs);
        self.exhausted = true;
        self.reset_at = now.saturating_add(delay);
        delay
    }

    pub fn on_success(&mut self) {
        *self = Self::default();
    }
}

/// `min(base × 2^(strikes−1), max)`.
pub fn cooldown_secs(strikes: u32, base_secs: u32, max_secs: u32) -> u64 {
    let shift = strikes.saturating_sub(1).min(31);
    u64::from(base_secs)
        .saturating_mul(1u64 << shift)
        .min(u64::from(max_secs))
}

/// "API quota exhausted. Resets in N seconds."
pub fn cooling_text(remaining_secs: u64) -> AdviceText {
    let mut t = AdviceText::new();
    let _ = write!(t, "API quota exhausted. Resets in {} seconds.", remaining_secs);
    t
}

/// Text shown right after a rate-limit answer.
pub fn exhausted_text(delay_secs: u64) -> AdviceText {
    let mut t = AdviceText::new();
    let _ = match delay_secs {
        3600 => write!(t, "API quota exhausted. Will retry in 1 hour."),
        d if d % 3600 == 0 => write!(t, "API quota exhausted. Will retry in {} hours.", d / 3600),
        d if d % 60 == 0 => write!(t, "API quota exhausted. Will retry in {} minutes.", d / 60),
        d => write!(t, "API quota exhausted. Will retry in {} seconds.", d),
    };
    t
}
