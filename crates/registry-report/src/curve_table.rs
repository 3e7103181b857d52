//! Curve tables: every point of every curve of a figure as CSV.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use registry_core::Figure;

use crate::error::{RenderError, Result};
use crate::kaplan_meier::SurvivalCurve;

#[derive(Debug, Serialize)]
struct CurveRow<'a> {
    group: &'a str,
    strata: &'a str,
    curve: &'a str,
    unit: &'a str,
    time: String,
    survival: String,
    std_error: String,
    at_risk: usize,
    events: usize,
    censored: usize,
}

fn write_rows<W: Write>(figure: &Figure<SurvivalCurve>, writer: &mut csv::Writer<W>) -> csv::Result<()> {
    for labeled in &figure.curves {
        for point in &labeled.curve.points {
            writer.serialize(CurveRow {
                group: &figure.group,
                strata: figure.dimension.slug(),
                curve: &labeled.label,
                unit: figure.unit.as_str(),
                time: format!("{:.4}", point.time),
                survival: format!("{:.6}", point.survival),
                std_error: format!("{:.6}", point.std_error),
                at_risk: point.at_risk,
                events: point.events,
                censored: point.censored,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Renders a figure's curve table as CSV text.
pub fn curve_table_csv(figure: &Figure<SurvivalCurve>) -> std::result::Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_rows(figure, &mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes a figure's curve table.
pub fn write_curve_table(figure: &Figure<SurvivalCurve>, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| RenderError::csv(path, err))?;
    write_rows(figure, &mut writer).map_err(|err| RenderError::csv(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kaplan_meier::KaplanMeier;
    use registry_core::{LabeledCurve, Stratum};
    use registry_model::{StrataDimension, TimeUnit};

    #[test]
    fn curve_table_lists_every_point() {
        let curve = KaplanMeier
            .fit("Lung - All patients", &[(1.0, true), (2.0, false)])
            .unwrap();
        let figure = Figure {
            group: "Lung".to_string(),
            dimension: StrataDimension::None,
            title: "Lung: Overall survival".to_string(),
            unit: TimeUnit::Years,
            curves: vec![LabeledCurve {
                stratum: Stratum {
                    region: None,
                    sex: None,
                },
                label: "All patients".to_string(),
                observations: 2,
                events: 1,
                curve,
            }],
        };

        insta::assert_snapshot!(curve_table_csv(&figure).unwrap(), @r"
        group,strata,curve,unit,time,survival,std_error,at_risk,events,censored
        Lung,global,All patients,years,0.0000,1.000000,0.000000,2,0,0
        Lung,global,All patients,years,1.0000,0.500000,0.353553,2,1,0
        Lung,global,All patients,years,2.0000,0.500000,0.353553,1,0,1
        ");
    }
}
