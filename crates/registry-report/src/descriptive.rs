//! Case counts by region, sex and tumor group.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use registry_model::{TumorGroups, TumorRecord};

use crate::error::{RenderError, Result};

const UNKNOWN: &str = "Unknown";
const TOTAL: &str = "Total";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseCount {
    pub region: String,
    pub sex: String,
    pub group: String,
    pub cases: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaseTabulation {
    pub total: usize,
    /// Patients below the age threshold or with unknown age.
    pub excluded: usize,
    pub rows: Vec<CaseCount>,
}

/// Counts adult cases by region × sex × tumor group.
///
/// Site codes outside every group count under the catch-all group.
pub fn tabulate_cases(
    records: &[TumorRecord],
    groups: &TumorGroups,
    minimum_age: i32,
) -> CaseTabulation {
    let mut counts: BTreeMap<(String, String, String), usize> = BTreeMap::new();
    let mut excluded = 0;
    for record in records {
        if !record.age_at_diagnosis.is_some_and(|age| age >= minimum_age) {
            excluded += 1;
            continue;
        }
        let key = (
            record
                .region
                .as_ref()
                .map_or_else(|| UNKNOWN.to_string(), ToString::to_string),
            record
                .sex
                .map_or_else(|| UNKNOWN.to_string(), |sex| sex.label().to_string()),
            groups.resolve(record.site.as_ref()).to_string(),
        );
        *counts.entry(key).or_default() += 1;
    }

    let rows: Vec<CaseCount> = counts
        .into_iter()
        .map(|((region, sex, group), cases)| CaseCount {
            region,
            sex,
            group,
            cases,
        })
        .collect();
    let total = rows.iter().map(|row| row.cases).sum();
    tracing::info!(stage = "describe", total, excluded, cells = rows.len(), "cases tabulated");
    CaseTabulation {
        total,
        excluded,
        rows,
    }
}

/// Writes the tabulation as CSV with a closing total row.
pub fn write_tabulation_csv(tabulation: &CaseTabulation, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| RenderError::csv(path, err))?;
    let total = CaseCount {
        region: TOTAL.to_string(),
        sex: String::new(),
        group: String::new(),
        cases: tabulation.total,
    };
    for row in tabulation.rows.iter().chain(std::iter::once(&total)) {
        writer
            .serialize(row)
            .map_err(|err| RenderError::csv(path, err))?;
    }
    writer
        .flush()
        .map_err(|err| RenderError::io(path, err))
}
