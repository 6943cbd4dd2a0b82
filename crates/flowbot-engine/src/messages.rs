// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned user-facing text: quotes, streak reminders, and notices.

use rand::seq::SliceRandom;

/// Sent when the sweep deletes a lapsed streak.
pub const STREAK_ENDED: &str = "Your streak has ended, finish a focus timer to start a new streak";

/// Sent after a qualifying focus session updates the streak.
pub const STREAK_UPDATED: &str = "Your streak has been updated! Check it with /streak";

/// Short motivational lines served by the `quote` command.
pub const QUOTES: [&str; 10] = [
    "Don’t watch the clock; do what it does. Keep going.",
    "Success is not final, failure is not fatal: It is the courage to continue that counts.",
    "Believe you can and you’re halfway there.",
    "The only way to do great work is to love what you do.",
    "Dream big and dare to fail.",
    "Your limitation—it’s only your imagination.",
    "Push yourself, because no one else is going to do it for you.",
    "Great things never come from comfort zones.",
    "Don’t stop when you’re tired. Stop when you’re done.",
    "Every day is a second chance.",
];

/// Daily nudges sent by the reminder sweep.
pub const REMINDERS: [&str; 10] = [
    "Don’t forget your focus streak today! Start a session to keep the momentum going.",
    "Your streak is on the line! Finish a focus timer and keep it alive.",
    "Another day, another focus session! Let’s keep that streak shining.",
    "Consistency is key! Start a focus timer and maintain your streak.",
    "Time to focus! Your streak is waiting for you, don’t let it slip.",
    "Keep the streak going! A single focus session keeps the streak alive.",
    "Hit your focus target today and keep your streak strong!",
    "FlowMode ON! Start a focus timer and ride the streak wave.",
    "Your streak is valuable, don’t break it! Focus for a few minutes now.",
    "Little steps build big habits! Start a focus session to continue your streak.",
];

pub fn random_quote() -> &'static str {
    pick(&QUOTES)
}

pub fn random_reminder() -> &'static str {
    pick(&REMINDERS)
}

fn pick(pool: &[&'static str]) -> &'static str {
    // Pools are non-empty constants.
    pool.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_picks_come_from_their_pool() {
        for _ in 0..50 {
            assert!(QUOTES.contains(&random_quote()));
            assert!(REMINDERS.contains(&random_reminder()));
        }
    }

    #[test]
    fn pools_have_no_duplicates() {
        for pool in [&QUOTES, &REMINDERS] {
            let mut sorted = pool.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), pool.len());
        }
    }
}
