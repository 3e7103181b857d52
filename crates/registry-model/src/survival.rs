//! Survival observations and stratification keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codes::{PersonId, RegionCode};
use crate::enums::Sex;

/// Mean Julian year length used for the day-to-year conversion.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Unit of survival durations handed to the curve estimator.
///
/// Durations in years are an approximation (`days / 365.25`) accepted for
/// curve estimation only; ages are always computed with calendar arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Days,
    #[default]
    Years,
}

impl TimeUnit {
    pub fn from_days(self, days: i64) -> f64 {
        match self {
            TimeUnit::Days => days as f64,
            TimeUnit::Years => days as f64 / DAYS_PER_YEAR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Days => "days",
            TimeUnit::Years => "years",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stratification key of one observation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StratumKey {
    pub group: String,
    pub region: Option<RegionCode>,
    pub sex: Option<Sex>,
}

/// One (duration, event) pair ready for curve estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalObservation {
    pub person_id: Option<PersonId>,
    /// Non-negative time from diagnosis to effective last contact.
    pub duration: f64,
    pub unit: TimeUnit,
    /// `true` when death was observed, `false` when censored.
    pub event: bool,
    pub key: StratumKey,
}
