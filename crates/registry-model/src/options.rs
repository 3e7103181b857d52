//! Options controlling linkage and curve stratification.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the linker resolves several death registrations for one person.
///
/// Duplicates are always reported; the policy only decides which record is
/// used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Use the record with the earliest usable death date, source order
    /// breaking ties.
    #[default]
    Earliest,
    /// Use the first record in source order that has a usable death date.
    First,
    /// Refuse to link when any identifier is duplicated.
    Strict,
}

/// Options for the record linker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkageOptions {
    /// Close of the observation window; censoring date for records with no
    /// recorded death and no recorded last contact.
    pub cutoff_date: NaiveDate,
    /// Primary-cause prefix reserved for malignant neoplasms.
    pub cancer_cause_prefix: String,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for LinkageOptions {
    fn default() -> Self {
        Self {
            cutoff_date: NaiveDate::from_ymd_opt(2019, 12, 31).unwrap_or_default(),
            cancer_cause_prefix: "C".to_string(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Stratification applied within one tumor group when drawing curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrataDimension {
    /// One curve for the whole group.
    None,
    /// One curve per configured region.
    Region,
    /// One curve per sex.
    Sex,
    /// One curve per configured region and sex.
    RegionSex,
}

impl StrataDimension {
    pub const ALL: [StrataDimension; 4] = [
        StrataDimension::None,
        StrataDimension::Region,
        StrataDimension::Sex,
        StrataDimension::RegionSex,
    ];

    /// Short name used in artifact file names.
    pub fn slug(self) -> &'static str {
        match self {
            StrataDimension::None => "global",
            StrataDimension::Region => "region",
            StrataDimension::Sex => "sex",
            StrataDimension::RegionSex => "region_sex",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            StrataDimension::None => "Overall survival",
            StrataDimension::Region => "Survival by region",
            StrataDimension::Sex => "Survival by sex",
            StrataDimension::RegionSex => "Survival by region and sex",
        }
    }
}

impl fmt::Display for StrataDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
