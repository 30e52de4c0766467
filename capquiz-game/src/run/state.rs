use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::run::{Prompt, QuizMode};

/// Lifecycle phase of a session. `Table` is the read-only browse state used by
/// the tabular mode and the reveal action; it is never scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    #[default]
    Menu,
    Active,
    Evaluation,
    Table,
}

/// A recorded mistake or skip: enough context to redisplay the prompt and to
/// seed a rerun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub country_id: String,
    pub kind: QuizMode,
    /// Display label the prompt carried when it was recorded.
    pub label: String,
}

/// Mutable state owned exclusively by one active run. Created whole at run
/// start, mutated only through session operations, and discarded on return to
/// the menu; reruns get a brand-new value seeded from the recorded entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunState {
    pub phase: RunPhase,
    /// Remaining prompts, front = current.
    pub queue: VecDeque<Prompt>,
    /// Fixed set eligible for resampling under the infinite policy; also the
    /// full selection for table display.
    pub pool: Vec<Prompt>,
    /// Connect mode: remaining source-side country ids.
    pub sources: Vec<String>,
    /// Connect mode: remaining target-side country ids.
    pub targets: Vec<String>,
    /// Once-per-run resolved capital, as an index into `Country::capitals`.
    pub capital_choices: HashMap<String, usize>,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub skipped_count: u32,
    pub wrong_set: Vec<ResultEntry>,
    pub skipped_set: Vec<ResultEntry>,
    /// Locate mode accumulators; zero elsewhere.
    pub point_score: u32,
    pub max_point_score: u32,
    /// Epoch milliseconds supplied by the host at run start.
    pub started_at_ms: u64,
    /// Set exactly once, on first entry into `Evaluation`.
    pub finished_at_ms: Option<u64>,
}

impl RunState {
    /// Record a wrong answer for the prompt. The count always increments; the
    /// entry list stays de-duplicated by country id.
    pub fn record_wrong(&mut self, entry: ResultEntry) {
        self.wrong_count += 1;
        Self::push_unique(&mut self.wrong_set, entry);
    }

    /// Record a skip for the prompt, with the same dedup rule as mistakes.
    pub fn record_skipped(&mut self, entry: ResultEntry) {
        self.skipped_count += 1;
        Self::push_unique(&mut self.skipped_set, entry);
    }

    fn push_unique(list: &mut Vec<ResultEntry>, entry: ResultEntry) {
        if !list.iter().any(|e| e.country_id == entry.country_id) {
            list.push(entry);
        }
    }

    /// Elapsed run time; frozen once the run is finished.
    #[must_use]
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.finished_at_ms
            .unwrap_or(now_ms)
            .saturating_sub(self.started_at_ms)
    }

    /// Whether the run has entered evaluation.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished_at_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> ResultEntry {
        ResultEntry {
            country_id: id.to_string(),
            kind: QuizMode::CountryToCapital,
            label: id.to_string(),
        }
    }

    #[test]
    fn repeated_records_bump_counts_but_not_lists() {
        let mut state = RunState::default();
        state.record_wrong(entry("FR"));
        state.record_wrong(entry("FR"));
        state.record_wrong(entry("DE"));
        assert_eq!(state.wrong_count, 3);
        assert_eq!(state.wrong_set.len(), 2);

        state.record_skipped(entry("FR"));
        state.record_skipped(entry("FR"));
        assert_eq!(state.skipped_count, 2);
        assert_eq!(state.skipped_set.len(), 1);
    }

    #[test]
    fn elapsed_freezes_at_finish() {
        let state = RunState {
            started_at_ms: 1_000,
            ..RunState::default()
        };
        assert_eq!(state.elapsed_ms(4_500), 3_500);

        let finished = RunState {
            started_at_ms: 1_000,
            finished_at_ms: Some(2_000),
            ..RunState::default()
        };
        assert_eq!(finished.elapsed_ms(9_999), 1_000);
        assert!(finished.is_finished());
    }

    #[test]
    fn elapsed_never_underflows() {
        let state = RunState {
            started_at_ms: 5_000,
            ..RunState::default()
        };
        assert_eq!(state.elapsed_ms(4_000), 0);
    }
}
