//! Prompt text for the remote advisory service.

use core::fmt::Write;

use super::AdvisoryRequest;

pub const PROMPT_CAP: usize = 768;

pub type Prompt = heapless::String<PROMPT_CAP>;

pub fn build(req: &AdvisoryRequest) -> Prompt {
    let mut p = Prompt::new();
    // Worst case is well under PROMPT_CAP; overflow would only truncate.
    let _ = write!(
        p,
        "You are an aquarium expert assistant. Analyze these parameters and provide \
         brief advice (max 100 words):\n\
         Ammonia: {:.2} ppm (ideal: 0 ppm)\n\
         Nitrite: {:.2} ppm (ideal: 0 ppm)\n\
         Nitrate: {:.1} ppm (ideal: below 20 ppm)\n\
         pH: {:.1} (ideal: 6.8-7.6)\n\
         Hours since feeding: {:.1} (feeding {:.1} times per day)\n\
         Days since water change: {:.1} (change every {:.1} days)\n\
         Fish mood: {}\n\
         Provide actionable advice if anything is wrong, or confirm if all is well.",
        req.ammonia_ppm,
        req.nitrite_ppm,
        req.nitrate_ppm,
        req.ph,
        req.hours_since_feed,
        req.feeds_per_day,
        req.days_since_water_change,
        req.water_change_interval_days,
        req.category.label(),
    );
    p
}
