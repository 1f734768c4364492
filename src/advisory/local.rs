//! Offline advice built from rule-engine output.
//!
//! Used for urgent (critical-mood) requests so the user gets actionable
//! text with no network dependency.

use crate::mood::{Factor, MoodResult};

use super::{AdviceText, AdvisoryResult};

fn action(factor: Factor, score: i8) -> &'static str {
    match (factor, score <= -2) {
        (Factor::Ammonia, true) => "Ammonia is toxic: change 50% of the water now and stop feeding for 24 h.",
        (Factor::Ammonia, false) => "Ammonia detected: change 25% of the water and feed lightly.",
        (Factor::Nitrite, true) => "Nitrite is toxic: change 50% of the water now and add bacteria starter.",
        (Factor::Nitrite, false) => "Nitrite detected: change 25% of the water and check the filter.",
        (Factor::Nitrate, true) => "Nitrate far too high: change 50% of the water and vacuum the gravel.",
        (Factor::Nitrate, false) => "Nitrate rising: plan a 25% water change.",
        (Factor::Ph, true) => "pH out of safe range: correct slowly, at most 0.2 per day.",
        (Factor::Ph, false) => "pH drifting: test again and check your buffer.",
        (Factor::Feeding, true) => "Fish are starving: feed a small portion now.",
        (Factor::Feeding, false) => "Feeding overdue: feed soon.",
        (Factor::Cleaning, true) => "Water change long overdue: change 30% of the water today.",
        (Factor::Cleaning, false) => "Water change due: schedule one in the next days.",
    }
}

/// Advice for every factor at −1 or worse, worst first.
pub fn local_advice(result: &MoodResult) -> AdvisoryResult {
    let mut text = AdviceText::new();

    if !result.reason.is_empty() {
        let _ = text.push_str(result.reason.as_str());
        let _ = text.push('\n');
    }

    let mut flagged: heapless::Vec<(Factor, i8), 6> = result
        .scores
        .iter()
        .filter(|(_, s)| *s <= -1)
        .collect();
    // Stable: keeps reporting order within the same severity.
    flagged.sort_by_key(|(_, s)| *s);

    if flagged.is_empty() {
        let _ = text.push_str("All parameters within range. No action needed.");
    }
    for (factor, score) in flagged {
        if text.push_str("- ").is_err()
            || text.push_str(action(factor, score)).is_err()
            || text.push('\n').is_err()
        {
            break;
        }
    }

    AdvisoryResult {
        success: true,
        text,
    }
}
