//! Per-factor threshold bands.
//!
//! Every factor maps onto {−2, −1, 0, +1, +2}. The first matching band wins.
//! Readings that are not finite (or negative concentrations) land in the
//! most severe band so a broken probe can never look healthy.

/// Ammonia (NH3/NH4+) in ppm. Any detectable amount is bad news.
pub fn ammonia(ppm: f32) -> i8 {
    if !ppm.is_finite() || ppm < 0.0 {
        return -2;
    }
    if ppm <= 0.0 {
        2
    } else if ppm < 0.25 {
        0
    } else if ppm < 0.5 {
        -1
    } else {
        -2
    }
}

/// Nitrite (NO2-) in ppm. Same toxicity profile as ammonia.
pub fn nitrite(ppm: f32) -> i8 {
    if !ppm.is_finite() || ppm < 0.0 {
        return -2;
    }
    if ppm <= 0.0 {
        2
    } else if ppm < 0.25 {
        0
    } else if ppm < 0.5 {
        -1
    } else {
        -2
    }
}

/// Nitrate (NO3-) in ppm. Tolerated in moderation.
pub fn nitrate(ppm: f32) -> i8 {
    if !ppm.is_finite() || ppm < 0.0 {
        return -2;
    }
    if ppm < 20.0 {
        2
    } else if ppm < 40.0 {
        1
    } else if ppm < 60.0 {
        0
    } else if ppm < 80.0 {
        -1
    } else {
        -2
    }
}

/// Ideal freshwater community band.
pub const PH_IDEAL: core::ops::RangeInclusive<f32> = 6.8..=7.6;

pub fn ph(ph: f32) -> i8 {
    if !ph.is_finite() {
        return -2;
    }
    if PH_IDEAL.contains(&ph) {
        2
    } else if (6.5..=8.0).contains(&ph) {
        0
    } else if (6.0..=8.5).contains(&ph) {
        -1
    } else {
        -2
    }
}

/// Elapsed time since `last` as a fraction of `interval`.
///
/// `None` when no interval is configured. A `last` in the future (clock
/// reset, manual entry) counts as zero elapsed.
pub fn elapsed_ratio(now: u64, last: u64, interval_secs: u32) -> Option<f32> {
    if interval_secs == 0 {
        return None;
    }
    let elapsed = now.saturating_sub(last);
    Some(elapsed as f32 / interval_secs as f32)
}

/// Feeding timeliness.
pub fn feeding(ratio: Option<f32>) -> i8 {
    let Some(r) = ratio else {
        return 0;
    };
    if r <= 1.0 {
        2
    } else if r <= 1.5 {
        0
    } else if r <= 2.0 {
        -1
    } else {
        -2
    }
}

/// Water-change timeliness. A freshly changed tank scores best.
pub fn cleaning(ratio: Option<f32>) -> i8 {
    let Some(r) = ratio else {
        return 0;
    };
    if r <= 0.5 {
        2
    } else if r <= 1.0 {
        1
    } else if r <= 1.25 {
        0
    } else if r <= 1.5 {
        -1
    } else {
        -2
    }
}
