//! Capquiz Game Engine
//!
//! Platform-agnostic core logic for the Capquiz geography quiz app.
//! This crate provides the dataset model, answer matching, and the quiz-run
//! state machine without UI or platform-specific dependencies.

pub mod answer;
pub mod data;
pub mod geo;
pub mod result;
pub mod run;
pub mod scope;

use anyhow::anyhow;
use std::collections::HashSet;
use std::rc::Rc;

// Re-export commonly used types
pub use answer::{acceptance_set, matches, normalize};
pub use data::{Capital, Country, CountryData, FlagRef};
pub use geo::{EARTH_RADIUS_KM, LOCATE_MAX_SCORE, haversine_km, locate_score};
pub use result::{ReplaySelection, RunSummary, format_elapsed};
pub use run::session::{GuessOutcome, LocateOutcome, PromptView, QuizSession, eligible_countries};
pub use run::state::{ResultEntry, RunPhase, RunState};
pub use run::{
    CountOption, CountPolicy, FIXED_COUNT_OPTIONS, Prompt, QuizMode, RngBundle, RunConfig,
    RunError, count_options, sample, shuffle,
};
pub use scope::Scope;

/// Trait for abstracting dataset loading operations.
/// Platform-specific implementations should provide this (the web host fetches
/// the bundled JSON once and hands it over).
pub trait DatasetLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the country dataset from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be loaded or parsed. The
    /// failure is terminal for the page load; the engine never retries.
    fn load_countries(&self) -> Result<CountryData, Self::Error>;
}

/// Main engine: loads the dataset once, caches it, and constructs quiz
/// sessions against it.
pub struct QuizEngine<L>
where
    L: DatasetLoader,
{
    loader: L,
    data: Option<Rc<CountryData>>,
}

impl<L> QuizEngine<L>
where
    L: DatasetLoader,
{
    /// Create a new engine with the provided dataset loader.
    pub const fn new(loader: L) -> Self {
        Self { loader, data: None }
    }

    /// Load and cache the dataset. A one-shot operation: subsequent calls
    /// return the cached copy without touching the loader again.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the dataset cannot be loaded.
    pub fn load(&mut self) -> Result<Rc<CountryData>, L::Error> {
        if let Some(data) = &self.data {
            return Ok(Rc::clone(data));
        }
        let data = Rc::new(self.loader.load_countries()?);
        self.data = Some(Rc::clone(&data));
        Ok(data)
    }

    /// The cached dataset, when loaded.
    #[must_use]
    pub fn data(&self) -> Option<&Rc<CountryData>> {
        self.data.as_ref()
    }

    /// Sorted continent values for the scope menu.
    #[must_use]
    pub fn continents(&self) -> Vec<String> {
        self.data.as_ref().map(|d| d.continents()).unwrap_or_default()
    }

    /// Sorted group values for the scope menu.
    #[must_use]
    pub fn groups(&self) -> Vec<String> {
        self.data.as_ref().map(|d| d.groups()).unwrap_or_default()
    }

    /// Number of countries a run with this configuration would draw from.
    /// Callers should check this before starting a run.
    #[must_use]
    pub fn eligible_count(&self, config: &RunConfig) -> usize {
        self.data
            .as_ref()
            .map_or(0, |d| eligible_countries(d, config, None).len())
    }

    /// Menu availability of the count options for a mode and scope.
    #[must_use]
    pub fn count_options(&self, mode: QuizMode, scope: &Scope) -> Vec<CountOption> {
        let probe = RunConfig::new(mode, scope.clone(), CountPolicy::All);
        count_options(self.eligible_count(&probe), mode)
    }

    /// Start a run (menu → active transition, or menu → table for the
    /// browse mode).
    ///
    /// # Errors
    ///
    /// Fails if the dataset is not loaded, the configuration is invalid, or
    /// the selection is empty.
    pub fn start_run(
        &self,
        config: RunConfig,
        seed: u64,
        now_ms: u64,
    ) -> Result<QuizSession, anyhow::Error> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| anyhow!("dataset not loaded"))?;
        Ok(QuizSession::new(Rc::clone(data), config, seed, now_ms)?)
    }

    /// Start a run restricted to an explicit id set (rerun/reveal paths when
    /// driven by the host rather than an existing session).
    ///
    /// # Errors
    ///
    /// Same conditions as [`QuizEngine::start_run`].
    pub fn start_run_with_ids(
        &self,
        config: RunConfig,
        ids: &HashSet<String>,
        seed: u64,
        now_ms: u64,
    ) -> Result<QuizSession, anyhow::Error> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| anyhow!("dataset not loaded"))?;
        Ok(QuizSession::from_explicit_ids(
            Rc::clone(data),
            config,
            ids,
            seed,
            now_ms,
        )?)
    }
}
