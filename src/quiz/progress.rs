//! Percent-complete for the header progress bar.
//!
//! Measured against every question currently visible under the live flags,
//! not only the ones reachable through branching, so heavily branched runs
//! can read lower than their real completion.

use super::condition::passes_show_if;
use super::model::Question;
use super::state::Flags;

/// Number of questions whose `showif` passes right now.
pub fn visible_count(questions: &[Question], flags: &Flags) -> usize {
    questions
        .iter()
        .filter(|q| passes_show_if(flags, *q))
        .count()
}

/// `round(100 * min(answered, visible) / visible)`, with `visible` floored to 1.
pub fn progress_percent(questions: &[Question], flags: &Flags, answered_count: usize) -> u8 {
    let visible = visible_count(questions, flags).max(1);
    let answered = answered_count.min(visible);
    ((answered as f64 * 100.0) / visible as f64).round() as u8
}
