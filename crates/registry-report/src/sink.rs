//! Figure output to a directory: one SVG chart and one curve table per figure.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use registry_core::{Figure, FigureSink};

use crate::curve_table::write_curve_table;
use crate::error::{RenderError, Result};
use crate::kaplan_meier::SurvivalCurve;
use crate::svg::render_figure_svg;

/// File-name stem of a figure: `<group>_<strata>` in lowercase ASCII.
pub fn figure_stem(figure: &Figure<SurvivalCurve>) -> String {
    let mut stem = String::with_capacity(figure.group.len() + 12);
    let mut last_sep = true;
    for ch in figure.group.chars() {
        if ch.is_ascii_alphanumeric() {
            stem.push(ch.to_ascii_lowercase());
            last_sep = false;
        } else if !last_sep {
            stem.push('_');
            last_sep = true;
        }
    }
    if !stem.ends_with('_') && !stem.is_empty() {
        stem.push('_');
    }
    stem.push_str(figure.dimension.slug());
    stem
}

/// Writes every accepted figure into `output_dir`.
///
/// Stems are unique per sink: a figure whose stem was already written gets a
/// numeric suffix (`colon_left_global_2`) instead of replacing the earlier files.
#[derive(Debug)]
pub struct DirectoryFigureSink {
    output_dir: PathBuf,
    artifacts: Vec<PathBuf>,
    stems: HashSet<String>,
}

impl DirectoryFigureSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|err| RenderError::io(&output_dir, err))?;
        Ok(Self {
            output_dir,
            artifacts: Vec::new(),
            stems: HashSet::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Files written so far, in write order.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    fn claim_stem(&mut self, figure: &Figure<SurvivalCurve>) -> String {
        let base = figure_stem(figure);
        if self.stems.insert(base.clone()) {
            return base;
        }
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{base}_{suffix}");
            if self.stems.insert(candidate.clone()) {
                tracing::warn!(
                    figure = %figure.title,
                    stem = %base,
                    renamed = %candidate,
                    "figure file name already used"
                );
                return candidate;
            }
            suffix += 1;
        }
    }
}

impl FigureSink<SurvivalCurve> for DirectoryFigureSink {
    type Error = RenderError;

    fn accept(&mut self, figure: &Figure<SurvivalCurve>) -> Result<()> {
        let stem = self.claim_stem(figure);

        let svg_path = self.output_dir.join(format!("{stem}.svg"));
        let svg = render_figure_svg(figure)?;
        fs::write(&svg_path, svg).map_err(|err| RenderError::io(&svg_path, err))?;
        self.artifacts.push(svg_path);

        let table_path = self.output_dir.join(format!("{stem}.csv"));
        write_curve_table(figure, &table_path)?;
        self.artifacts.push(table_path);

        tracing::debug!(figure = %figure.title, stem = %stem, "figure written");
        Ok(())
    }
}
