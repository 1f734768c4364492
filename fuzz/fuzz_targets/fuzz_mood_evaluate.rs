//! Fuzz target: `mood::evaluate`
//!
//! Builds a parameter snapshot from raw bytes (NaN, infinities and
//! timestamps in the future included) and checks that evaluation never
//! panics, keeps the total in range and never calls a broken reading
//! healthy.
//!
//! cargo fuzz run fuzz_mood_evaluate

#![no_main]

use aquamood::advisory::local::local_advice;
use aquamood::mood::{MoodCategory, ParameterSnapshot, evaluate};
use libfuzzer_sys::fuzz_target;

fn f32_at(data: &[u8], at: usize) -> f32 {
    let mut b = [0u8; 4];
    for (i, byte) in b.iter_mut().enumerate() {
        *byte = data.get(at + i).copied().unwrap_or(0);
    }
    f32::from_le_bytes(b)
}

fn u64_at(data: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    for (i, byte) in b.iter_mut().enumerate() {
        *byte = data.get(at + i).copied().unwrap_or(0);
    }
    u64::from_le_bytes(b)
}

fuzz_target!(|data: &[u8]| {
    let snapshot = ParameterSnapshot {
        ammonia_ppm: f32_at(data, 0),
        nitrite_ppm: f32_at(data, 4),
        nitrate_ppm: f32_at(data, 8),
        ph: f32_at(data, 12),
        last_feed_secs: u64_at(data, 16),
        last_water_change_secs: u64_at(data, 24),
        feed_interval_secs: u64_at(data, 32) as u32,
        water_change_interval_secs: u64_at(data, 40) as u32,
    };
    let now = u64_at(data, 48);

    let result = evaluate(&snapshot, now);
    assert!((-12..=12).contains(&result.total));

    let readings = [
        snapshot.ammonia_ppm,
        snapshot.nitrite_ppm,
        snapshot.nitrate_ppm,
        snapshot.ph,
    ];
    if readings.iter().any(|v| !v.is_finite()) {
        assert_eq!(result.category, MoodCategory::Angry);
    }

    // Advice built from any result must fit its buffer.
    let advice = local_advice(&result);
    assert!(advice.success);
    assert!(!advice.text.is_empty());
});
