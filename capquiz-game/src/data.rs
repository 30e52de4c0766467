use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::scope::Scope;

/// Membership tags (continents, groups). Most countries carry only a handful.
pub type TagSet = SmallVec<[String; 4]>;

/// A capital city belonging to a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capital {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl Capital {
    /// Coordinates in degrees, when the dataset carries them.
    #[must_use]
    pub const fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Opaque reference to a flag image resource. The engine never interprets it;
/// license fields are display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FlagRef {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub attribution_required: bool,
}

/// One country record in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// Stable short code, unique across the dataset.
    pub id: String,
    /// Canonical display name.
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub continents: TagSet,
    #[serde(default)]
    pub groups: TagSet,
    #[serde(default)]
    pub capitals: Vec<Capital>,
    #[serde(default)]
    pub flag: FlagRef,
}

impl Country {
    /// Whether any capital carries coordinates (required by the locate mode).
    #[must_use]
    pub fn has_located_capital(&self) -> bool {
        self.capitals.iter().any(|c| c.coords().is_some())
    }
}

/// Container for the full country dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CountryData {
    pub countries: Vec<Country>,
}

impl CountryData {
    /// Create an empty dataset (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            countries: Vec::new(),
        }
    }

    /// Load the dataset from a JSON array of country records.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid country data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Create a dataset from pre-parsed countries
    #[must_use]
    pub fn from_countries(countries: Vec<Country>) -> Self {
        Self { countries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Look up a country by its id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.id == id)
    }

    /// Sorted, de-duplicated continent tags present in the dataset.
    #[must_use]
    pub fn continents(&self) -> Vec<String> {
        Self::collect_tags(self.countries.iter().flat_map(|c| c.continents.iter()))
    }

    /// Sorted, de-duplicated group tags present in the dataset.
    #[must_use]
    pub fn groups(&self) -> Vec<String> {
        Self::collect_tags(self.countries.iter().flat_map(|c| c.groups.iter()))
    }

    fn collect_tags<'a>(tags: impl Iterator<Item = &'a String>) -> Vec<String> {
        let mut out: Vec<String> = tags.cloned().collect();
        out.sort();
        out.dedup();
        out
    }

    /// Countries matching a scope, in dataset order.
    #[must_use]
    pub fn filter_scope(&self, scope: &Scope) -> Vec<&Country> {
        self.countries.iter().filter(|c| scope.matches(c)).collect()
    }
}
