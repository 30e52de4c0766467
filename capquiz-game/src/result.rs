//! Evaluation-screen summary and replay selection.

use serde::{Deserialize, Serialize};

use crate::run::QuizMode;
use crate::run::state::ResultEntry;
use crate::scope::Scope;

/// Which recorded entries seed a replay action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaySelection {
    Wrong,
    Skipped,
    /// Mistakes and skips together, de-duplicated by country.
    Union,
}

/// Everything the evaluation screen renders for one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: QuizMode,
    pub scope: Scope,
    pub correct: u32,
    pub wrong: u32,
    pub skipped: u32,
    /// Locate-mode accumulators; zero for tally-scored modes.
    pub point_score: u32,
    pub max_point_score: u32,
    pub elapsed_ms: u64,
    pub wrong_entries: Vec<ResultEntry>,
    pub skipped_entries: Vec<ResultEntry>,
}

impl RunSummary {
    /// Elapsed time formatted as `HH:MM:SS` for the timer display.
    #[must_use]
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_ms)
    }
}

/// Format a millisecond duration as `HH:MM:SS`, truncating sub-second time.
#[must_use]
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total_secs = elapsed_ms / 1000;
    let hrs = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{hrs:02}:{mins:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero_and_subsecond() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(999), "00:00:00");
    }

    #[test]
    fn formats_mixed_durations() {
        assert_eq!(format_elapsed(61_000), "00:01:01");
        assert_eq!(format_elapsed(3_723_000), "01:02:03");
        assert_eq!(format_elapsed(100 * 3600 * 1000), "100:00:00");
    }
}
