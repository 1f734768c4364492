//! Mood rule engine.
//!
//! Maps a [`ParameterSnapshot`] and the current time onto six sub-scores, an
//! aggregate total and a [`MoodCategory`]. The engine is override-based:
//!
//! 1. any factor in its worst band forces `Angry`;
//! 2. otherwise any factor at −1 gives `Sad` (total ≥ 0) or `Angry`;
//! 3. otherwise the total decides: ≥ 6 `Happy`, ≥ 0 `Sad`, else `Angry`.
//!
//! A single catastrophic reading is never masked by a good aggregate.
//! [`evaluate`] is pure: no I/O, no shared state.

pub mod bands;

use core::fmt::Write;

use serde::{Deserialize, Serialize};

/// Capacity of the human-readable reason string.
pub const REASON_CAP: usize = 128;

pub type Reason = heapless::String<REASON_CAP>;

// ───────────────────────────────────────────────────────────────
// Inputs
// ───────────────────────────────────────────────────────────────

/// Immutable copy of the water and care parameters at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub ammonia_ppm: f32,
    pub nitrite_ppm: f32,
    pub nitrate_ppm: f32,
    /// Acidity, 0–14.
    pub ph: f32,
    /// Seconds-since-boot timestamp of the last feed.
    pub last_feed_secs: u64,
    /// Seconds-since-boot timestamp of the last water change.
    pub last_water_change_secs: u64,
    pub feed_interval_secs: u32,
    pub water_change_interval_secs: u32,
}

impl ParameterSnapshot {
    pub fn hours_since_feed(&self, now: u64) -> f32 {
        now.saturating_sub(self.last_feed_secs) as f32 / 3600.0
    }

    pub fn days_since_water_change(&self, now: u64) -> f32 {
        now.saturating_sub(self.last_water_change_secs) as f32 / 86_400.0
    }
}

// ───────────────────────────────────────────────────────────────
// Outputs
// ───────────────────────────────────────────────────────────────

/// Coarse health signal; the discriminant is the frame bank index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MoodCategory {
    Happy = 0,
    Sad = 1,
    Angry = 2,
}

impl MoodCategory {
    pub const ALL: [Self; 3] = [Self::Happy, Self::Sad, Self::Angry];

    pub const fn bank(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Happy => "HAPPY",
            Self::Sad => "SAD",
            Self::Angry => "ANGRY",
        }
    }

    /// Directory name of this category's frames on storage.
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
        }
    }

    pub const fn from_bank(bank: u8) -> Option<Self> {
        match bank {
            0 => Some(Self::Happy),
            1 => Some(Self::Sad),
            2 => Some(Self::Angry),
            _ => None,
        }
    }
}

/// The six scored factors, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    Ammonia,
    Nitrite,
    Nitrate,
    Ph,
    Feeding,
    Cleaning,
}

impl Factor {
    pub const ALL: [Self; 6] = [
        Self::Ammonia,
        Self::Nitrite,
        Self::Nitrate,
        Self::Ph,
        Self::Feeding,
        Self::Cleaning,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ammonia => "ammonia",
            Self::Nitrite => "nitrite",
            Self::Nitrate => "nitrate",
            Self::Ph => "pH",
            Self::Feeding => "feeding",
            Self::Cleaning => "cleaning",
        }
    }
}

/// Per-factor sub-scores, each in −2..=+2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FactorScores {
    pub ammonia: i8,
    pub nitrite: i8,
    pub nitrate: i8,
    pub ph: i8,
    pub feeding: i8,
    pub cleaning: i8,
}

impl FactorScores {
    pub fn get(&self, factor: Factor) -> i8 {
        match factor {
            Factor::Ammonia => self.ammonia,
            Factor::Nitrite => self.nitrite,
            Factor::Nitrate => self.nitrate,
            Factor::Ph => self.ph,
            Factor::Feeding => self.feeding,
            Factor::Cleaning => self.cleaning,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, i8)> + '_ {
        Factor::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    pub fn total(&self) -> i8 {
        self.iter().map(|(_, s)| s).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoodResult {
    pub scores: FactorScores,
    /// Sum of the six sub-scores, −12..=12.
    pub total: i8,
    pub category: MoodCategory,
    pub reason: Reason,
}

impl MoodResult {
    /// Factors scoring at or below `threshold`, in reporting order.
    pub fn factors_at_or_below(&self, threshold: i8) -> impl Iterator<Item = Factor> + '_ {
        self.scores
            .iter()
            .filter(move |&(_, s)| s <= threshold)
            .map(|(f, _)| f)
    }

    /// True when a factor sits in its most severe band.
    pub fn is_critical(&self) -> bool {
        self.factors_at_or_below(-2).next().is_some()
    }
}

// ───────────────────────────────────────────────────────────────
// Engine
// ───────────────────────────────────────────────────────────────

const HAPPY_TOTAL: i8 = 6;

/// Score `snapshot` at time `now` (seconds since boot).
pub fn evaluate(snapshot: &ParameterSnapshot, now: u64) -> MoodResult {
    let feed_ratio = bands::elapsed_ratio(now, snapshot.last_feed_secs, snapshot.feed_interval_secs);
    let clean_ratio = bands::elapsed_ratio(
        now,
        snapshot.last_water_change_secs,
        snapshot.water_change_interval_secs,
    );

    let scores = FactorScores {
        ammonia: bands::ammonia(snapshot.ammonia_ppm),
        nitrite: bands::nitrite(snapshot.nitrite_ppm),
        nitrate: bands::nitrate(snapshot.nitrate_ppm),
        ph: bands::ph(snapshot.ph),
        feeding: bands::feeding(feed_ratio),
        cleaning: bands::cleaning(clean_ratio),
    };
    let total = scores.total();

    let mut reason = Reason::new();

    // Rule 1: a single critical factor overrides everything.
    if let Some((factor, _)) = scores.iter().find(|&(_, s)| s <= -2) {
        write_critical(&mut reason, factor, snapshot, now);
        return MoodResult {
            scores,
            total,
            category: MoodCategory::Angry,
            reason,
        };
    }

    // Rule 2: warnings; the total only decides between Sad and Angry.
    if scores.iter().any(|(_, s)| s <= -1) {
        let _ = reason.push_str("Warning: ");
        let mut first = true;
        for (factor, _) in scores.iter().filter(|&(_, s)| s <= -1) {
            if !first {
                let _ = reason.push_str(", ");
            }
            let _ = reason.push_str(factor.label());
            first = false;
        }
        let category = if total >= 0 {
            MoodCategory::Sad
        } else {
            MoodCategory::Angry
        };
        return MoodResult {
            scores,
            total,
            category,
            reason,
        };
    }

    // Rule 3: nothing below zero.
    let category = if total >= HAPPY_TOTAL {
        let _ = reason.push_str("All parameters healthy");
        MoodCategory::Happy
    } else if total >= 0 {
        let _ = reason.push_str("Parameters acceptable, room for improvement");
        MoodCategory::Sad
    } else {
        let _ = reason.push_str("Overall conditions poor");
        MoodCategory::Angry
    };

    MoodResult {
        scores,
        total,
        category,
        reason,
    }
}

fn write_critical(reason: &mut Reason, factor: Factor, snap: &ParameterSnapshot, now: u64) {
    // Overflowing the fixed buffer truncates the text; never fatal.
    let _ = match factor {
        Factor::Ammonia => write!(
            reason,
            "CRITICAL: ammonia {:.2} ppm is toxic",
            snap.ammonia_ppm
        ),
        Factor::Nitrite => write!(
            reason,
            "CRITICAL: nitrite {:.2} ppm is toxic",
            snap.nitrite_ppm
        ),
        Factor::Nitrate => write!(
            reason,
            "CRITICAL: nitrate {:.0} ppm is far too high",
            snap.nitrate_ppm
        ),
        Factor::Ph => write!(reason, "CRITICAL: pH {:.1} is outside the safe range", snap.ph),
        Factor::Feeding => write!(
            reason,
            "CRITICAL: fish not fed for {:.1} hours",
            snap.hours_since_feed(now)
        ),
        Factor::Cleaning => {
            let interval_days = snap.water_change_interval_secs as f32 / 86_400.0;
            let overdue = (snap.days_since_water_change(now) - interval_days).max(0.0);
            write!(reason, "CRITICAL: water change overdue by {:.1} days", overdue)
        }
    };
}
