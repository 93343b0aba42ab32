//! Scoring rules shared by the lesson player and progress displays.

/// Lives a learner starts every lesson session with.
pub const STARTING_LIVES: u8 = 3;

/// XP granted for each correctly answered step.
pub const XP_PER_CORRECT: u32 = 10;

/// XP awarded for finishing a lesson with `correct` right answers.
#[must_use]
pub fn xp_award(correct: u32) -> u32 {
    correct.saturating_mul(XP_PER_CORRECT)
}

/// Lives left after a wrong answer. Never goes below zero.
#[must_use]
pub fn lose_life(lives: u8) -> u8 {
    lives.saturating_sub(1)
}

/// Whole-number percentage of steps already passed, for progress bars.
#[must_use]
pub fn progress_percent(cursor: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = cursor.min(total).saturating_mul(100) / total;
    u8::try_from(pct).unwrap_or(100)
}
