use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::Country;

/// A predicate over the dataset: the whole world, one continent, or one group.
/// Continent and group value sets are derived from the dataset, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Scope {
    #[default]
    World,
    Continent(String),
    Group(String),
}

impl Scope {
    /// Whether a country falls inside this scope.
    #[must_use]
    pub fn matches(&self, country: &Country) -> bool {
        match self {
            Self::World => true,
            Self::Continent(value) => country.continents.iter().any(|c| c == value),
            Self::Group(value) => country.groups.iter().any(|g| g == value),
        }
    }

    /// Display label for the selected scope value.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::World => "World",
            Self::Continent(value) | Self::Group(value) => value,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
