//! Closed code sets used by the registry.
//!
//! Each enum maps to and from the numeric code stored in the registry
//! exports so that stage tables stay readable by the registry's own tools.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parses a small integer code, tolerating spreadsheet float artifacts.
fn parse_small_code(raw: &str) -> Option<u8> {
    let trimmed = raw.trim();
    let int = match trimmed.split_once('.') {
        Some((int, frac)) if frac.chars().all(|ch| ch == '0') => int,
        Some(_) => return None,
        None => trimmed,
    };
    int.parse::<u8>().ok()
}

/// Patient sex as coded by the registry (`1` male, `2` female).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    pub fn from_code(raw: &str) -> Option<Self> {
        match parse_small_code(raw)? {
            1 => Some(Sex::Male),
            2 => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Vital status as of the observation cutoff (`1` alive, `2` dead).
///
/// Unknown or blank codes in the tumor source are read as [`VitalStatus::Alive`];
/// the record linker is the only stage that decides a patient is dead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VitalStatus {
    #[default]
    Alive,
    Dead,
}

impl VitalStatus {
    pub fn from_code(raw: &str) -> Self {
        match parse_small_code(raw) {
            Some(2) => VitalStatus::Dead,
            _ => VitalStatus::Alive,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            VitalStatus::Alive => 1,
            VitalStatus::Dead => 2,
        }
    }

    pub fn is_dead(self) -> bool {
        matches!(self, VitalStatus::Dead)
    }
}

/// Underlying cause of death (`1` cancer, `2` other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CauseOfDeath {
    Cancer,
    Other,
}

impl CauseOfDeath {
    pub fn from_code(raw: &str) -> Option<Self> {
        match parse_small_code(raw)? {
            1 => Some(CauseOfDeath::Cancer),
            2 => Some(CauseOfDeath::Other),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            CauseOfDeath::Cancer => 1,
            CauseOfDeath::Other => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CauseOfDeath::Cancer => "cancer",
            CauseOfDeath::Other => "other",
        }
    }
}

impl fmt::Display for CauseOfDeath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ICD-O behavior code (fifth digit of the morphology code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorCode(u8);

impl BehaviorCode {
    /// Malignant, primary site.
    pub const MALIGNANT: BehaviorCode = BehaviorCode(3);

    pub fn new(code: u8) -> Self {
        Self(code)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        parse_small_code(raw).map(Self)
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn is_malignant(self) -> bool {
        self == Self::MALIGNANT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_codes_roundtrip() {
        for sex in Sex::ALL {
            assert_eq!(Sex::from_code(&sex.code().to_string()), Some(sex));
        }
        assert_eq!(Sex::from_code("2.0"), Some(Sex::Female));
        assert_eq!(Sex::from_code("9"), None);
        assert_eq!(Sex::from_code(""), None);
    }

    #[test]
    fn vital_status_defaults_to_alive() {
        assert_eq!(VitalStatus::from_code("2"), VitalStatus::Dead);
        assert_eq!(VitalStatus::from_code("1"), VitalStatus::Alive);
        assert_eq!(VitalStatus::from_code(""), VitalStatus::Alive);
        assert_eq!(VitalStatus::from_code("x"), VitalStatus::Alive);
    }

    #[test]
    fn behavior_code_malignant_sentinel() {
        assert!(BehaviorCode::parse("3").unwrap().is_malignant());
        assert!(BehaviorCode::parse("3.0").unwrap().is_malignant());
        assert!(!BehaviorCode::parse("2").unwrap().is_malignant());
        assert!(BehaviorCode::parse("3.5").is_none());
    }
}
