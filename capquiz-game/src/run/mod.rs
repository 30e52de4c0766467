//! Run configuration: quiz modes, scopes, count policies, and the seeded
//! randomness seam shared by every run.

pub mod session;
pub mod state;

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::scope::Scope;

/// The fixed-N options offered by the menu, in display order.
pub const FIXED_COUNT_OPTIONS: [usize; 4] = [100, 50, 25, 10];

/// Quiz direction for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum QuizMode {
    #[default]
    CountryToCapital,
    CapitalToCountry,
    Connect,
    CountryToFlag,
    FlagToCountry,
    MapLocate,
    Table,
}

impl QuizMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CountryToCapital => "country-to-capital",
            Self::CapitalToCountry => "capital-to-country",
            Self::Connect => "connect",
            Self::CountryToFlag => "country-to-flag",
            Self::FlagToCountry => "flag-to-country",
            Self::MapLocate => "map-locate",
            Self::Table => "table",
        }
    }

    /// Modes that consume a prompt queue item by item.
    #[must_use]
    pub const fn uses_queue(self) -> bool {
        !matches!(self, Self::Connect | Self::Table)
    }

    /// Modes whose answers arrive as typed text.
    #[must_use]
    pub const fn is_direct_entry(self) -> bool {
        matches!(
            self,
            Self::CountryToCapital | Self::CapitalToCountry | Self::CountryToFlag | Self::FlagToCountry
        )
    }

    /// Whether the unbounded resample policy is coherent for this mode.
    /// Connect and table require exhaustion of a fixed selection.
    #[must_use]
    pub const fn supports_infinite(self) -> bool {
        self.uses_queue()
    }

    /// Modes that need a resolved capital per country at run start. The locate
    /// mode scores against every capital and needs no single resolution.
    #[must_use]
    pub const fn needs_capital(self) -> bool {
        matches!(
            self,
            Self::CountryToCapital | Self::CapitalToCountry | Self::Connect
        )
    }

    /// The locate mode tracks points instead of correct/wrong tallies.
    #[must_use]
    pub const fn is_point_scored(self) -> bool {
        matches!(self, Self::MapLocate)
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "country-to-capital" => Ok(Self::CountryToCapital),
            "capital-to-country" => Ok(Self::CapitalToCountry),
            "connect" => Ok(Self::Connect),
            "country-to-flag" => Ok(Self::CountryToFlag),
            "flag-to-country" => Ok(Self::FlagToCountry),
            "map-locate" => Ok(Self::MapLocate),
            "table" => Ok(Self::Table),
            _ => Err(()),
        }
    }
}

/// How many prompts seed a run, and whether the queue is finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CountPolicy {
    /// Every country matching the scope.
    #[default]
    All,
    /// A random sample of N, clipped to the available count.
    Fixed(usize),
    /// A perpetually resampled queue over the full matching set.
    Infinite,
}

impl CountPolicy {
    #[must_use]
    pub const fn is_infinite(self) -> bool {
        matches!(self, Self::Infinite)
    }
}

impl fmt::Display for CountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Infinite => f.write_str("infinite"),
        }
    }
}

impl FromStr for CountPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "infinite" | "∞" => Ok(Self::Infinite),
            other => other.parse::<usize>().map(Self::Fixed).map_err(|_| ()),
        }
    }
}

/// One selectable count option with its menu availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountOption {
    pub policy: CountPolicy,
    pub enabled: bool,
}

/// Menu availability for all/100/50/25/10/infinite given the number of
/// countries eligible under the current scope and mode.
#[must_use]
pub fn count_options(available: usize, mode: QuizMode) -> Vec<CountOption> {
    let mut options = Vec::with_capacity(FIXED_COUNT_OPTIONS.len() + 2);
    options.push(CountOption {
        policy: CountPolicy::All,
        enabled: available > 0,
    });
    for n in FIXED_COUNT_OPTIONS {
        options.push(CountOption {
            policy: CountPolicy::Fixed(n),
            enabled: available >= n,
        });
    }
    options.push(CountOption {
        policy: CountPolicy::Infinite,
        enabled: available > 0 && mode.supports_infinite(),
    });
    options
}

/// Complete configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunConfig {
    pub mode: QuizMode,
    pub scope: Scope,
    pub count: CountPolicy,
}

impl RunConfig {
    #[must_use]
    pub fn new(mode: QuizMode, scope: Scope, count: CountPolicy) -> Self {
        Self { mode, scope, count }
    }

    /// Reject mode/count combinations that would produce an unbounded game
    /// over a selection that must be exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidCountPolicy`] for infinite + connect/table.
    pub fn validate(&self) -> Result<(), RunError> {
        if self.count.is_infinite() && !self.mode.supports_infinite() {
            return Err(RunError::InvalidCountPolicy { mode: self.mode });
        }
        Ok(())
    }
}

/// Errors surfaced when a run cannot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunError {
    /// The scope (intersected with any explicit rerun set) selects nothing
    /// usable; the caller stays in the menu.
    #[error("no countries are eligible for the requested run")]
    EmptySelection,
    /// The infinite policy was combined with a mode that must exhaust its
    /// selection.
    #[error("infinite count policy is not valid for mode {mode}")]
    InvalidCountPolicy { mode: QuizMode },
}

/// One quiz question instance: a country plus the direction that produced it.
/// The kind travels with the id so mixed rerun lists render correctly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prompt {
    pub country_id: String,
    pub kind: QuizMode,
}

impl Prompt {
    #[must_use]
    pub fn new(country_id: impl Into<String>, kind: QuizMode) -> Self {
        Self {
            country_id: country_id.into(),
            kind,
        }
    }
}

/// Deterministic bundle of RNG streams segregated by run concern, so a fixed
/// user seed reproduces queue order, sampled selections, and capital choices
/// independently of one another.
#[derive(Debug, Clone)]
pub struct RngBundle {
    order: RefCell<SmallRng>,
    capitals: RefCell<SmallRng>,
    resample: RefCell<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            order: RefCell::new(SmallRng::seed_from_u64(derive_stream_seed(seed, b"order"))),
            capitals: RefCell::new(SmallRng::seed_from_u64(derive_stream_seed(seed, b"capitals"))),
            resample: RefCell::new(SmallRng::seed_from_u64(derive_stream_seed(seed, b"resample"))),
        }
    }

    /// Stream driving shuffles and fixed-N sampling.
    #[must_use]
    pub fn order(&self) -> RefMut<'_, SmallRng> {
        self.order.borrow_mut()
    }

    /// Stream driving the once-per-run capital resolution.
    #[must_use]
    pub fn capitals(&self) -> RefMut<'_, SmallRng> {
        self.capitals.borrow_mut()
    }

    /// Stream driving infinite-policy pool draws.
    #[must_use]
    pub fn resample(&self) -> RefMut<'_, SmallRng> {
        self.resample.borrow_mut()
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

/// Uniform in-place permutation (Fisher-Yates).
pub fn shuffle<T, R: rand::Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// `k` distinct elements in random order; a full permutation when
/// `k >= items.len()`.
#[must_use]
pub fn sample<T: Clone, R: rand::Rng>(items: &[T], k: usize, rng: &mut R) -> Vec<T> {
    let mut out: Vec<T> = items.to_vec();
    shuffle(&mut out, rng);
    out.truncate(k);
    out
}

/// Uniform choice of one element, or `None` on an empty slice.
#[must_use]
pub fn choose<'a, T, R: rand::Rng>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.gen_range(0..items.len())])
    }
}
