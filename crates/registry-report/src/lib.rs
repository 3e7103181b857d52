//! Survival reporting.
//!
//! - **kaplan_meier**: product-limit estimator with Greenwood standard errors
//! - **curve_table** / **svg**: per-figure CSV tables and SVG step charts
//! - **sink**: writes figures produced by the strata driver to a directory
//! - **descriptive**: case counts by region, sex and tumor group

pub mod curve_table;
pub mod descriptive;
pub mod error;
pub mod kaplan_meier;
pub mod sink;
pub mod svg;

pub use curve_table::{curve_table_csv, write_curve_table};
pub use descriptive::{CaseCount, CaseTabulation, tabulate_cases, write_tabulation_csv};
pub use error::{EstimatorError, RenderError, Result};
pub use kaplan_meier::{CurvePoint, KaplanMeier, SurvivalCurve};
pub use sink::{DirectoryFigureSink, figure_stem};
pub use svg::render_figure_svg;
