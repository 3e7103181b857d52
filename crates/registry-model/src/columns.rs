//! Source column names of the registry exports.

use serde::{Deserialize, Serialize};

/// Column names of the tumor registry export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TumorColumns {
    pub person_id: String,
    pub region: String,
    pub diagnosis_date: String,
    pub birth_date: String,
    pub last_contact_date: String,
    pub site: String,
    pub behavior: String,
    pub sex: String,
    pub vital_status: String,
    pub cause_of_death: String,
    /// Passthrough columns carried unchanged into the stage exports.
    pub retained: Vec<String>,
}

impl Default for TumorColumns {
    fn default() -> Self {
        Self {
            person_id: "RUT".to_string(),
            region: "REGCOM".to_string(),
            diagnosis_date: "FECDIAG".to_string(),
            birth_date: "FECNAC".to_string(),
            last_contact_date: "FECCON".to_string(),
            site: "TOP".to_string(),
            behavior: "COMP".to_string(),
            sex: "SEXO".to_string(),
            vital_status: "VM".to_string(),
            cause_of_death: "CAUSA".to_string(),
            retained: [
                "TUMOURID", "NOCASO", "CODRUT", "MORF", "BASE", "C10", "CODPRI", "PMSEC",
                "PMTOT", "GRA", "EXT", "LAT",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl TumorColumns {
    /// Columns that must be present in a tumor source table.
    pub fn required(&self) -> [&str; 8] {
        [
            self.person_id.as_str(),
            self.region.as_str(),
            self.diagnosis_date.as_str(),
            self.birth_date.as_str(),
            self.last_contact_date.as_str(),
            self.site.as_str(),
            self.behavior.as_str(),
            self.sex.as_str(),
        ]
    }

    /// Outcome columns; absent in raw registry exports, present in linked
    /// stage tables.
    pub fn outcome(&self) -> [&str; 2] {
        [self.vital_status.as_str(), self.cause_of_death.as_str()]
    }
}

/// Column names of the mortality registry export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MortalityColumns {
    pub person_id: String,
    pub day: String,
    pub month: String,
    pub year: String,
    pub primary_cause: String,
}

impl Default for MortalityColumns {
    fn default() -> Self {
        Self {
            person_id: "RUN".to_string(),
            day: "DIA_DEF".to_string(),
            month: "MES_DEF".to_string(),
            year: "ANO_DEF".to_string(),
            primary_cause: "DIAG1".to_string(),
        }
    }
}

impl MortalityColumns {
    pub fn required(&self) -> [&str; 5] {
        [
            self.person_id.as_str(),
            self.day.as_str(),
            self.month.as_str(),
            self.year.as_str(),
            self.primary_cause.as_str(),
        ]
    }
}
