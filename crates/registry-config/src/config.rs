//! Configuration types and registry defaults.

use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use registry_model::{
    DuplicatePolicy, LinkageOptions, MortalityColumns, OTHER_GROUP, RegionCode, SiteCode,
    StrataDimension, TimeUnit, TumorColumns, TumorGroup, TumorGroups,
};

use crate::error::{ConfigError, Result};

/// Topography codes of the registry's standard survival cohort.
const DEFAULT_SITE_CODES: &[&str] = &[
    "339", "340", "341", "342", "343", "348", "349", "619", "160", "161", "162", "163", "164",
    "165", "166", "168", "169", "180", "181", "182", "183", "184", "185", "186", "187", "188",
    "189", "209", "500", "501", "502", "503", "504", "505", "506", "508", "509", "239", "530",
    "531", "538", "539", "220", "221",
];

const DEFAULT_TUMOR_GROUPS: &[(&str, &[&str])] = &[
    (
        "Trachea, bronchus and lung",
        &["33.9", "340", "341", "342", "343", "348", "349"],
    ),
    ("Prostate", &["619"]),
    (
        "Stomach",
        &["160", "161", "162", "163", "164", "165", "166", "168", "169"],
    ),
    (
        "Colon",
        &["180", "181", "182", "183", "184", "185", "186", "187", "188", "189"],
    ),
    ("Rectum", &["209"]),
    (
        "Breast",
        &["500", "501", "502", "503", "504", "505", "506", "508", "509"],
    ),
    ("Gallbladder", &["239"]),
    ("Cervix uteri", &["530", "531", "538", "539"]),
    ("Liver", &["220", "221", "222", "223", "224", "227", "229"]),
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

/// Lowercase alphanumeric form of a group name; names sharing it would share
/// figure file names.
fn group_name_key(name: &str) -> String {
    name.chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_site_codes<'a>(
    field: &str,
    values: impl IntoIterator<Item = &'a String>,
) -> Result<BTreeSet<SiteCode>> {
    values
        .into_iter()
        .map(|value| {
            if SiteCode::has_ambiguous_fraction(value) {
                tracing::debug!(
                    field,
                    value = %value,
                    "site code with a zero fraction is read as an integer"
                );
            }
            value.parse::<SiteCode>().map_err(|source| ConfigError::InvalidCode {
                field: field.to_string(),
                source,
            })
        })
        .collect()
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub columns: TumorColumns,
    pub mortality_columns: MortalityColumns,
    pub cohort: CohortConfig,
    pub linkage: LinkageConfig,
    pub survival: SurvivalConfig,
}

impl RegistryConfig {
    /// Checks cross-field constraints and that every configured code parses.
    pub fn validate(&self) -> Result<()> {
        if self.cohort.start_year > self.cohort.end_year {
            return Err(ConfigError::InvalidYearRange {
                start: self.cohort.start_year,
                end: self.cohort.end_year,
            });
        }
        self.cohort.site_code_set()?;
        self.survival.tumor_groups()?;
        self.survival.region_codes()?;
        Ok(())
    }
}

/// Inclusion criteria of the analysis cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortConfig {
    pub site_codes: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    pub minimum_age: i32,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            site_codes: strings(DEFAULT_SITE_CODES),
            start_year: 2011,
            end_year: 2019,
            minimum_age: 15,
        }
    }
}

impl CohortConfig {
    pub fn site_code_set(&self) -> Result<BTreeSet<SiteCode>> {
        parse_site_codes("cohort.site_codes", &self.site_codes)
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }
}

/// Mortality linkage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkageConfig {
    pub cutoff_date: NaiveDate,
    pub cancer_cause_prefix: String,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for LinkageConfig {
    fn default() -> Self {
        let options = LinkageOptions::default();
        Self {
            cutoff_date: options.cutoff_date,
            cancer_cause_prefix: options.cancer_cause_prefix,
            duplicate_policy: options.duplicate_policy,
        }
    }
}

impl LinkageConfig {
    pub fn options(&self) -> LinkageOptions {
        LinkageOptions {
            cutoff_date: self.cutoff_date,
            cancer_cause_prefix: self.cancer_cause_prefix.trim().to_ascii_uppercase(),
            duplicate_policy: self.duplicate_policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TumorGroupConfig {
    pub name: String,
    pub site_codes: Vec<String>,
}

/// Survival dataset and curve settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivalConfig {
    pub time_unit: TimeUnit,
    /// Regions compared by the region strata; all observed regions when empty.
    pub regions: Vec<String>,
    pub strata: Vec<StrataDimension>,
    pub tumor_groups: Vec<TumorGroupConfig>,
}

impl Default for SurvivalConfig {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::Years,
            regions: strings(&["2101", "2201"]),
            strata: StrataDimension::ALL.to_vec(),
            tumor_groups: DEFAULT_TUMOR_GROUPS
                .iter()
                .map(|(name, codes)| TumorGroupConfig {
                    name: (*name).to_string(),
                    site_codes: strings(codes),
                })
                .collect(),
        }
    }
}

impl SurvivalConfig {
    pub fn tumor_groups(&self) -> Result<TumorGroups> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        let mut groups = Vec::with_capacity(self.tumor_groups.len());
        for (index, group) in self.tumor_groups.iter().enumerate() {
            let name = group.name.trim();
            if name.is_empty() {
                return Err(ConfigError::EmptyGroupName { index });
            }
            if group_name_key(name) == group_name_key(OTHER_GROUP) {
                return Err(ConfigError::ReservedGroupName {
                    name: name.to_string(),
                });
            }
            if let Some(existing) = seen.insert(group_name_key(name), name) {
                if existing == name {
                    return Err(ConfigError::DuplicateGroupName {
                        name: name.to_string(),
                    });
                }
                return Err(ConfigError::AmbiguousGroupName {
                    name: name.to_string(),
                    existing: existing.to_string(),
                });
            }
            let field = format!("survival.tumor_groups[{name}]");
            let codes = parse_site_codes(&field, &group.site_codes)?;
            groups.push(TumorGroup::new(name, codes));
        }
        Ok(TumorGroups::new(groups))
    }

    pub fn region_codes(&self) -> Result<Vec<RegionCode>> {
        let mut regions: Vec<RegionCode> = Vec::with_capacity(self.regions.len());
        for value in &self.regions {
            let region = value
                .parse::<RegionCode>()
                .map_err(|source| ConfigError::InvalidCode {
                    field: "survival.regions".to_string(),
                    source,
                })?;
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
        Ok(regions)
    }
}
