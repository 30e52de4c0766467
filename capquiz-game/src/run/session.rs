//! The quiz-run state machine: one [`QuizSession`] per run, from start until
//! the host returns to the menu.
//!
//! All operations are synchronous, atomic transitions over the owned
//! [`RunState`]; the host serializes input events. Timestamps arrive as epoch
//! milliseconds from the host so the crate stays free of platform clocks.

use log::{debug, info};
use rand::Rng;
use std::collections::HashSet;
use std::rc::Rc;

use crate::answer::{self, normalize};
use crate::data::{Capital, Country, CountryData};
use crate::geo::{LOCATE_MAX_SCORE, haversine_km, locate_score};
use crate::run::state::{ResultEntry, RunPhase, RunState};
use crate::run::{CountPolicy, Prompt, QuizMode, RngBundle, RunConfig, RunError, choose, sample, shuffle};
use crate::result::{ReplaySelection, RunSummary};

/// Transient feedback for one guess; the host decides display duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct,
    Wrong,
}

/// Feedback for one locate confirmation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocateOutcome {
    pub distance_km: f64,
    pub points: u32,
}

/// The current prompt as the host should render it.
#[derive(Debug, Clone, Copy)]
pub struct PromptView<'a> {
    pub kind: QuizMode,
    pub country: &'a Country,
    /// The once-per-run resolved capital, for modes that have one.
    pub capital: Option<&'a Capital>,
    /// Text shown as the prompt (country name, or capital name when guessing
    /// countries from capitals).
    pub label: &'a str,
}

/// One quiz run: configuration, owned state, dataset handle, and the seeded
/// RNG bundle. Constructed whole via [`QuizSession::new`]; reruns build a
/// fresh session seeded from the recorded result entries.
#[derive(Debug, Clone)]
pub struct QuizSession {
    data: Rc<CountryData>,
    config: RunConfig,
    state: RunState,
    rng: Rc<RngBundle>,
}

impl QuizSession {
    /// Start a run over the scope-filtered dataset.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidCountPolicy`] for infinite + connect/table,
    /// and [`RunError::EmptySelection`] when nothing is eligible.
    pub fn new(
        data: Rc<CountryData>,
        config: RunConfig,
        seed: u64,
        now_ms: u64,
    ) -> Result<Self, RunError> {
        Self::start(data, config, None, seed, now_ms)
    }

    /// Start a run over the intersection of the scope filter and an explicit
    /// id set (the rerun and reveal paths).
    ///
    /// # Errors
    ///
    /// Same conditions as [`QuizSession::new`].
    pub fn from_explicit_ids(
        data: Rc<CountryData>,
        config: RunConfig,
        ids: &HashSet<String>,
        seed: u64,
        now_ms: u64,
    ) -> Result<Self, RunError> {
        Self::start(data, config, Some(ids), seed, now_ms)
    }

    fn start(
        data: Rc<CountryData>,
        config: RunConfig,
        explicit_ids: Option<&HashSet<String>>,
        seed: u64,
        now_ms: u64,
    ) -> Result<Self, RunError> {
        config.validate()?;
        let rng = Rc::new(RngBundle::from_user_seed(seed));

        let candidates = eligible_countries(&data, &config, explicit_ids);
        if candidates.is_empty() {
            return Err(RunError::EmptySelection);
        }

        let selected: Vec<&Country> = match config.count {
            CountPolicy::Fixed(n) => sample(&candidates, n, &mut *rng.order()),
            CountPolicy::All | CountPolicy::Infinite => candidates,
        };

        let mut state = RunState {
            started_at_ms: now_ms,
            ..RunState::default()
        };

        if config.mode.needs_capital() {
            let mut capital_rng = rng.capitals();
            for country in &selected {
                // Eligibility guarantees a non-empty capital list here.
                let idx = capital_rng.gen_range(0..country.capitals.len());
                state.capital_choices.insert(country.id.clone(), idx);
            }
        }

        let mut prompts: Vec<Prompt> = selected
            .iter()
            .map(|c| Prompt::new(c.id.clone(), config.mode))
            .collect();

        match config.mode {
            QuizMode::Connect => {
                state.sources = selected.iter().map(|c| c.id.clone()).collect();
                state.targets = state.sources.clone();
                state.phase = RunPhase::Active;
            }
            QuizMode::Table => {
                state.pool = prompts;
                state.phase = RunPhase::Table;
            }
            _ => {
                shuffle(&mut prompts, &mut *rng.order());
                state.pool = prompts.clone();
                state.queue = prompts.into();
                state.phase = RunPhase::Active;
            }
        }

        info!(
            "starting {} run: {} selected, scope {}, count {}",
            config.mode,
            selected.len(),
            config.scope,
            config.count
        );

        Ok(Self {
            data,
            config,
            state,
            rng,
        })
    }

    /// Evaluate a typed guess against the current prompt. Returns `None` when
    /// no turn is consumed: empty/whitespace guess, exhausted queue, or an
    /// operation that does not apply to this mode or phase.
    pub fn submit_guess(&mut self, guess: &str, now_ms: u64) -> Option<GuessOutcome> {
        if self.state.phase != RunPhase::Active || !self.config.mode.is_direct_entry() {
            return None;
        }
        let canonical = normalize(guess);
        if canonical.is_empty() {
            return None;
        }
        let prompt = self.state.queue.front()?.clone();
        let country = self.data.get(&prompt.country_id)?;

        let correct = match self.config.mode {
            QuizMode::CountryToCapital => {
                let capital = self.resolved_capital(&country.id)?;
                answer::matches(guess, &capital.name, &capital.aliases)
            }
            QuizMode::CapitalToCountry | QuizMode::FlagToCountry => {
                answer::matches(guess, &country.name, &country.aliases)
            }
            // The flag answer arrives as the picked flag's country id.
            QuizMode::CountryToFlag => canonical == normalize(&country.id),
            _ => false,
        };

        if correct {
            self.state.correct_count += 1;
            self.advance_past_front(now_ms);
            Some(GuessOutcome::Correct)
        } else {
            let entry = self.entry_for(&prompt);
            self.state.record_wrong(entry);
            debug!("wrong guess for {}", prompt.country_id);
            Some(GuessOutcome::Wrong)
        }
    }

    /// Skip the current prompt: finite runs rotate it to the back of the
    /// queue, infinite runs discard it and draw a fresh resample from the
    /// pool. Returns `false` when nothing was skipped.
    pub fn skip(&mut self) -> bool {
        if self.state.phase != RunPhase::Active || !self.config.mode.uses_queue() {
            return false;
        }
        let Some(prompt) = self.state.queue.pop_front() else {
            return false;
        };
        let entry = self.entry_for(&prompt);
        self.state.record_skipped(entry);
        if self.config.count.is_infinite() {
            self.push_resample();
        } else {
            self.state.queue.push_back(prompt);
        }
        true
    }

    /// Abandon the run. Finite policies record every remaining prompt as
    /// skipped before entering evaluation; infinite policies record nothing.
    pub fn abort(&mut self, now_ms: u64) {
        if self.state.phase != RunPhase::Active {
            return;
        }
        if !self.config.count.is_infinite() {
            if self.config.mode == QuizMode::Connect {
                let remaining: Vec<Prompt> = self
                    .state
                    .sources
                    .iter()
                    .map(|id| Prompt::new(id.clone(), QuizMode::Connect))
                    .collect();
                for prompt in remaining {
                    let entry = self.entry_for(&prompt);
                    self.state.record_skipped(entry);
                }
            } else {
                while let Some(prompt) = self.state.queue.pop_front() {
                    let entry = self.entry_for(&prompt);
                    self.state.record_skipped(entry);
                }
            }
        }
        self.finish(now_ms);
    }

    /// Connect mode: propose that a source country and a target capital
    /// belong together. Correct iff both ids name the same country. Returns
    /// `None` when either id is no longer on the board.
    pub fn propose_pair(
        &mut self,
        source_id: &str,
        target_id: &str,
        now_ms: u64,
    ) -> Option<GuessOutcome> {
        if self.state.phase != RunPhase::Active || self.config.mode != QuizMode::Connect {
            return None;
        }
        if !self.state.sources.iter().any(|id| id == source_id)
            || !self.state.targets.iter().any(|id| id == target_id)
        {
            return None;
        }

        if source_id == target_id {
            self.state.sources.retain(|id| id != source_id);
            self.state.targets.retain(|id| id != target_id);
            self.state.correct_count += 1;
            if self.state.sources.is_empty() && self.state.targets.is_empty() {
                self.finish(now_ms);
            }
            Some(GuessOutcome::Correct)
        } else {
            let prompt = Prompt::new(source_id.to_string(), QuizMode::Connect);
            let entry = self.entry_for(&prompt);
            self.state.record_wrong(entry);
            Some(GuessOutcome::Wrong)
        }
    }

    /// Locate mode: confirm a map click. Scores the minimum haversine
    /// distance over the country's capitals and always advances the queue;
    /// distance affects points, never progression.
    pub fn confirm_location(&mut self, lat: f64, lon: f64, now_ms: u64) -> Option<LocateOutcome> {
        if self.state.phase != RunPhase::Active || self.config.mode != QuizMode::MapLocate {
            return None;
        }
        let prompt = self.state.queue.front()?.clone();
        let country = self.data.get(&prompt.country_id)?;

        let distance_km = country
            .capitals
            .iter()
            .filter_map(Capital::coords)
            .map(|(cap_lat, cap_lon)| haversine_km(lat, lon, cap_lat, cap_lon))
            .fold(f64::INFINITY, f64::min);
        let points = if distance_km.is_finite() {
            locate_score(distance_km)
        } else {
            0
        };

        self.state.point_score += points;
        self.state.max_point_score += LOCATE_MAX_SCORE;
        self.advance_past_front(now_ms);
        Some(LocateOutcome {
            distance_km,
            points,
        })
    }

    fn advance_past_front(&mut self, now_ms: u64) {
        self.state.queue.pop_front();
        if self.config.count.is_infinite() {
            self.push_resample();
        } else if self.state.queue.is_empty() {
            self.finish(now_ms);
        }
    }

    fn push_resample(&mut self) {
        // The pool is fixed at run start and non-empty whenever a prompt
        // existed to consume.
        if let Some(next) = choose(&self.state.pool, &mut *self.rng.resample()) {
            self.state.queue.push_back(next.clone());
        }
    }

    fn finish(&mut self, now_ms: u64) {
        if self.state.finished_at_ms.is_none() {
            self.state.finished_at_ms = Some(now_ms);
            info!(
                "run finished: {} correct, {} wrong, {} skipped",
                self.state.correct_count, self.state.wrong_count, self.state.skipped_count
            );
        }
        self.state.phase = RunPhase::Evaluation;
    }

    fn entry_for(&self, prompt: &Prompt) -> ResultEntry {
        let label = self
            .data
            .get(&prompt.country_id)
            .map_or_else(|| prompt.country_id.clone(), |c| self.prompt_label(c).to_string());
        ResultEntry {
            country_id: prompt.country_id.clone(),
            kind: prompt.kind,
            label,
        }
    }

    fn prompt_label<'a>(&'a self, country: &'a Country) -> &'a str {
        if self.config.mode == QuizMode::CapitalToCountry {
            if let Some(capital) = self.resolved_capital(&country.id) {
                return &capital.name;
            }
        }
        &country.name
    }

    /// The prompt at the front of the queue, ready for rendering.
    #[must_use]
    pub fn current(&self) -> Option<PromptView<'_>> {
        let prompt = self.state.queue.front()?;
        let country = self.data.get(&prompt.country_id)?;
        Some(PromptView {
            kind: prompt.kind,
            country,
            capital: self.resolved_capital(&country.id),
            label: self.prompt_label(country),
        })
    }

    /// The capital resolved for a country at run start, fixed for the run.
    #[must_use]
    pub fn resolved_capital(&self, country_id: &str) -> Option<&Capital> {
        let idx = *self.state.capital_choices.get(country_id)?;
        self.data.get(country_id)?.capitals.get(idx)
    }

    /// Prompts still pending; `None` renders as unbounded under the infinite
    /// policy.
    #[must_use]
    pub fn pending(&self) -> Option<usize> {
        if self.config.count.is_infinite() {
            return None;
        }
        if self.config.mode == QuizMode::Connect {
            Some(self.state.sources.len())
        } else {
            Some(self.state.queue.len())
        }
    }

    /// Connect mode: remaining source items, sorted by country name.
    #[must_use]
    pub fn connect_sources(&self) -> Vec<&Country> {
        let mut rows: Vec<&Country> = self
            .state
            .sources
            .iter()
            .filter_map(|id| self.data.get(id))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Connect mode: remaining target items with their resolved capitals,
    /// sorted by capital name so the two columns order independently.
    #[must_use]
    pub fn connect_targets(&self) -> Vec<(&Capital, &Country)> {
        let mut rows: Vec<(&Capital, &Country)> = self
            .state
            .targets
            .iter()
            .filter_map(|id| {
                let country = self.data.get(id)?;
                let capital = self.resolved_capital(id)?;
                Some((capital, country))
            })
            .collect();
        rows.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        rows
    }

    /// Table mode and reveal: the selected countries, sorted by name.
    #[must_use]
    pub fn table_rows(&self) -> Vec<&Country> {
        let mut rows: Vec<&Country> = self
            .state
            .pool
            .iter()
            .filter_map(|p| self.data.get(&p.country_id))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Final (or live) summary for the evaluation screen.
    #[must_use]
    pub fn summary(&self, now_ms: u64) -> RunSummary {
        RunSummary {
            mode: self.config.mode,
            scope: self.config.scope.clone(),
            correct: self.state.correct_count,
            wrong: self.state.wrong_count,
            skipped: self.state.skipped_count,
            point_score: self.state.point_score,
            max_point_score: self.state.max_point_score,
            elapsed_ms: self.state.elapsed_ms(now_ms),
            wrong_entries: self.state.wrong_set.clone(),
            skipped_entries: self.state.skipped_set.clone(),
        }
    }

    /// Country ids backing a replay action, de-duplicated by id with the
    /// wrong-before-skipped order preserved for the union.
    #[must_use]
    pub fn replay_ids(&self, selection: ReplaySelection) -> Vec<String> {
        let entries: Vec<&ResultEntry> = match selection {
            ReplaySelection::Wrong => self.state.wrong_set.iter().collect(),
            ReplaySelection::Skipped => self.state.skipped_set.iter().collect(),
            ReplaySelection::Union => self
                .state
                .wrong_set
                .iter()
                .chain(self.state.skipped_set.iter())
                .collect(),
        };
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|e| seen.insert(e.country_id.clone()))
            .map(|e| e.country_id.clone())
            .collect()
    }

    /// Start a brand-new run over the recorded mistakes and/or skips,
    /// preserving mode and scope with the take-all policy.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::EmptySelection`] when the selection is empty.
    pub fn rerun(
        &self,
        selection: ReplaySelection,
        seed: u64,
        now_ms: u64,
    ) -> Result<Self, RunError> {
        let ids: HashSet<String> = self.replay_ids(selection).into_iter().collect();
        let config = RunConfig::new(self.config.mode, self.config.scope.clone(), CountPolicy::All);
        Self::from_explicit_ids(Rc::clone(&self.data), config, &ids, seed, now_ms)
    }

    /// Route the union of mistakes and skips into the read-only table state.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::EmptySelection`] when both lists are empty.
    pub fn reveal(&self, seed: u64, now_ms: u64) -> Result<Self, RunError> {
        let ids: HashSet<String> = self.replay_ids(ReplaySelection::Union).into_iter().collect();
        let config = RunConfig::new(QuizMode::Table, self.config.scope.clone(), CountPolicy::All);
        Self::from_explicit_ids(Rc::clone(&self.data), config, &ids, seed, now_ms)
    }

    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.state.phase
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Borrow the underlying run state.
    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }
}

/// Countries usable for a run: scope-filtered, intersected with an explicit
/// id set when given, and restricted to entries carrying the data the mode
/// needs (capitals, or located capitals for the map).
#[must_use]
pub fn eligible_countries<'a>(
    data: &'a CountryData,
    config: &RunConfig,
    explicit_ids: Option<&HashSet<String>>,
) -> Vec<&'a Country> {
    data.filter_scope(&config.scope)
        .into_iter()
        .filter(|c| explicit_ids.is_none_or(|ids| ids.contains(&c.id)))
        .filter(|c| !config.mode.needs_capital() || !c.capitals.is_empty())
        .filter(|c| config.mode != QuizMode::MapLocate || c.has_located_capital())
        .collect()
}
