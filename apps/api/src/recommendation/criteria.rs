use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A dimension along which job candidates are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Distance,
    Salary,
    Categories,
    Reputation,
}

/// Priority used for workers who never chose one.
pub const DEFAULT_PREFERENCE_ORDER: [Criterion; 4] = [
    Criterion::Distance,
    Criterion::Salary,
    Criterion::Categories,
    Criterion::Reputation,
];

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Distance => "distance",
            Criterion::Salary => "salary",
            Criterion::Categories => "categories",
            Criterion::Reputation => "reputation",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriterionError {
    #[error("unknown criterion '{0}'")]
    Unknown(String),
    #[error("criterion '{0}' is listed more than once")]
    Duplicate(String),
}

impl FromStr for Criterion {
    type Err = CriterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(Criterion::Distance),
            "salary" => Ok(Criterion::Salary),
            "categories" => Ok(Criterion::Categories),
            "reputation" => Ok(Criterion::Reputation),
            other => Err(CriterionError::Unknown(other.to_string())),
        }
    }
}

/// Worker-chosen ranking of criteria, most important first. Each criterion appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PreferenceOrder(Vec<Criterion>);

impl PreferenceOrder {
    /// Parses an order submitted by a user. Unknown or repeated identifiers are rejected.
    pub fn parse_strict<S: AsRef<str>>(raw: &[S]) -> Result<Self, CriterionError> {
        let mut seen = HashSet::new();
        let mut order = Vec::with_capacity(raw.len());
        for item in raw {
            let criterion: Criterion = item.as_ref().parse()?;
            if !seen.insert(criterion) {
                return Err(CriterionError::Duplicate(criterion.to_string()));
            }
            order.push(criterion);
        }
        Ok(Self(order))
    }

    /// Reads an order that is already persisted. Unknown identifiers are skipped
    /// and only the first occurrence of a repeated criterion counts.
    pub fn from_stored<S: AsRef<str>>(raw: &[S]) -> Self {
        let mut seen = HashSet::new();
        let order = raw
            .iter()
            .filter_map(|item| item.as_ref().parse::<Criterion>().ok())
            .filter(|criterion| seen.insert(*criterion))
            .collect();
        Self(order)
    }

    pub fn as_slice(&self) -> &[Criterion] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl Default for PreferenceOrder {
    fn default() -> Self {
        Self(DEFAULT_PREFERENCE_ORDER.to_vec())
    }
}

impl From<Vec<Criterion>> for PreferenceOrder {
    fn from(order: Vec<Criterion>) -> Self {
        let mut seen = HashSet::new();
        Self(order.into_iter().filter(|c| seen.insert(*c)).collect())
    }
}
