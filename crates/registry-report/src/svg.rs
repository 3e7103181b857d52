//! SVG step charts of survival curves.

use std::fmt::Display;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use registry_core::Figure;

use crate::error::{RenderError, Result};
use crate::kaplan_meier::SurvivalCurve;

const WIDTH: f64 = 820.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 220.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const X_TICKS: usize = 5;

const PALETTE: [&str; 8] = [
    "#1f77b4", "#d62728", "#2ca02c", "#ff7f0e", "#9467bd", "#8c564b", "#e377c2", "#17becf",
];

fn xml_error(err: impl Display) -> RenderError {
    RenderError::Xml {
        message: err.to_string(),
    }
}

fn fmt(value: f64) -> String {
    format!("{value:.2}")
}

/// Chart area mapping from (time, survival) to pixels.
struct Plot {
    max_time: f64,
}

impl Plot {
    fn x(&self, time: f64) -> f64 {
        MARGIN_LEFT + time / self.max_time * (WIDTH - MARGIN_LEFT - MARGIN_RIGHT)
    }

    fn y(&self, survival: f64) -> f64 {
        MARGIN_TOP + (1.0 - survival) * (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM)
    }
}

/// Rounds the time axis up to a value that divides evenly into ticks.
fn axis_limit(max_time: f64) -> f64 {
    if max_time <= 0.0 {
        return 1.0;
    }
    let step = (max_time / X_TICKS as f64).ceil().max(1.0);
    step * X_TICKS as f64
}

/// Step path `M x0 y0 H x1 V y1 ...` of one curve.
fn step_path(plot: &Plot, curve: &SurvivalCurve) -> String {
    let mut path = format!("M {} {}", fmt(plot.x(0.0)), fmt(plot.y(1.0)));
    for point in &curve.points {
        path.push_str(&format!(
            " H {} V {}",
            fmt(plot.x(point.time)),
            fmt(plot.y(point.survival))
        ));
    }
    path
}

struct SvgWriter {
    xml: Writer<Vec<u8>>,
}

impl SvgWriter {
    fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
        let mut element = BytesStart::new(name);
        for attr in attrs {
            element.push_attribute(*attr);
        }
        element
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.xml
            .write_event(Event::Start(Self::element(name, attrs)))
            .map_err(xml_error)
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.xml
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.xml
            .write_event(Event::Empty(Self::element(name, attrs)))
            .map_err(xml_error)
    }

    fn text(&mut self, attrs: &[(&str, &str)], content: &str) -> Result<()> {
        self.start("text", attrs)?;
        self.xml
            .write_event(Event::Text(BytesText::new(content)))
            .map_err(xml_error)?;
        self.end("text")
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) -> Result<()> {
        self.empty(
            "line",
            &[
                ("x1", fmt(x1).as_str()),
                ("y1", fmt(y1).as_str()),
                ("x2", fmt(x2).as_str()),
                ("y2", fmt(y2).as_str()),
                ("stroke", stroke),
            ],
        )
    }
}

/// Renders all curves of a figure as one SVG document.
pub fn render_figure_svg(figure: &Figure<SurvivalCurve>) -> Result<String> {
    let max_time = figure
        .curves
        .iter()
        .map(|labeled| labeled.curve.max_time())
        .fold(0.0, f64::max);
    let plot = Plot {
        max_time: axis_limit(max_time),
    };
    let mut svg = SvgWriter {
        xml: Writer::new_with_indent(Vec::new(), b' ', 2),
    };

    svg.xml
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    svg.start(
        "svg",
        &[
            ("xmlns", "http://www.w3.org/2000/svg"),
            ("width", fmt(WIDTH).as_str()),
            ("height", fmt(HEIGHT).as_str()),
            ("viewBox", format!("0 0 {WIDTH} {HEIGHT}").as_str()),
            ("font-family", "sans-serif"),
            ("font-size", "12"),
        ],
    )?;
    svg.empty(
        "rect",
        &[("width", "100%"), ("height", "100%"), ("fill", "white")],
    )?;
    svg.text(
        &[
            ("x", fmt(WIDTH / 2.0).as_str()),
            ("y", "28"),
            ("text-anchor", "middle"),
            ("font-size", "16"),
        ],
        &figure.title,
    )?;

    // Axes and ticks.
    let (x0, y0) = (plot.x(0.0), plot.y(0.0));
    svg.line(x0, y0, plot.x(plot.max_time), y0, "black")?;
    svg.line(x0, y0, x0, plot.y(1.0), "black")?;
    for tick in 0..=X_TICKS {
        let time = plot.max_time * tick as f64 / X_TICKS as f64;
        let x = plot.x(time);
        svg.line(x, y0, x, y0 + 5.0, "black")?;
        svg.text(
            &[("x", fmt(x).as_str()), ("y", fmt(y0 + 20.0).as_str()), ("text-anchor", "middle")],
            &format!("{time:.0}"),
        )?;
    }
    for tick in 0..=4 {
        let survival = f64::from(tick) * 0.25;
        let y = plot.y(survival);
        svg.line(x0 - 5.0, y, x0, y, "black")?;
        svg.line(x0, y, plot.x(plot.max_time), y, "#e0e0e0")?;
        svg.text(
            &[("x", fmt(x0 - 8.0).as_str()), ("y", fmt(y + 4.0).as_str()), ("text-anchor", "end")],
            &format!("{survival:.2}"),
        )?;
    }
    svg.text(
        &[
            ("x", fmt((x0 + plot.x(plot.max_time)) / 2.0).as_str()),
            ("y", fmt(HEIGHT - 15.0).as_str()),
            ("text-anchor", "middle"),
        ],
        &format!("Time ({})", figure.unit),
    )?;
    let y_label_at = (MARGIN_TOP + y0) / 2.0;
    svg.text(
        &[
            ("x", "18"),
            ("y", fmt(y_label_at).as_str()),
            ("text-anchor", "middle"),
            ("transform", format!("rotate(-90 18 {})", fmt(y_label_at)).as_str()),
        ],
        "Survival probability",
    )?;

    // Curves, censoring marks and legend.
    for (idx, labeled) in figure.curves.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        svg.start("g", &[("class", "curve"), ("stroke", color)])?;
        svg.empty(
            "path",
            &[
                ("d", step_path(&plot, &labeled.curve).as_str()),
                ("fill", "none"),
                ("stroke-width", "2"),
            ],
        )?;
        for point in labeled.curve.points.iter().filter(|p| p.censored > 0) {
            let (x, y) = (plot.x(point.time), plot.y(point.survival));
            svg.line(x, y - 4.0, x, y + 4.0, color)?;
        }
        svg.end("g")?;

        let legend_x = WIDTH - MARGIN_RIGHT + 20.0;
        let legend_y = MARGIN_TOP + 20.0 * idx as f64;
        svg.line(legend_x, legend_y, legend_x + 20.0, legend_y, color)?;
        svg.text(
            &[("x", fmt(legend_x + 26.0).as_str()), ("y", fmt(legend_y + 4.0).as_str())],
            &format!(
                "{} (n={}, d={})",
                labeled.label, labeled.observations, labeled.events
            ),
        )?;
    }

    svg.end("svg")?;
    String::from_utf8(svg.xml.into_inner()).map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kaplan_meier::KaplanMeier;
    use registry_core::{LabeledCurve, Stratum};
    use registry_model::{Sex, StrataDimension, TimeUnit};

    fn figure() -> Figure<SurvivalCurve> {
        let curve = |sex: Sex, samples: &[(f64, bool)]| LabeledCurve {
            stratum: Stratum {
                region: None,
                sex: Some(sex),
            },
            label: sex.label().to_string(),
            observations: samples.len(),
            events: samples.iter().filter(|(_, e)| *e).count(),
            curve: KaplanMeier.fit(sex.label(), samples).unwrap(),
        };
        Figure {
            group: "Stomach & esophagus".to_string(),
            dimension: StrataDimension::Sex,
            title: "Stomach & esophagus: Survival by sex".to_string(),
            unit: TimeUnit::Years,
            curves: vec![
                curve(Sex::Male, &[(1.0, true), (2.5, false), (3.0, true)]),
                curve(Sex::Female, &[(4.0, false)]),
            ],
        }
    }

    #[test]
    fn svg_has_one_path_per_curve() {
        let svg = render_figure_svg(&figure()).unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert_eq!(svg.matches("<path ").count(), 2);
        assert!(svg.contains("Male (n=3, d=2)"));
        assert!(svg.contains("Time (years)"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn text_is_escaped() {
        let svg = render_figure_svg(&figure()).unwrap();
        assert!(svg.contains("Stomach &amp; esophagus"));
        assert!(!svg.contains("Stomach & esophagus"));
    }

    #[test]
    fn axis_limit_rounds_up() {
        assert_eq!(axis_limit(0.0), 1.0);
        assert_eq!(axis_limit(8.7), 10.0);
        assert_eq!(axis_limit(2.0), 5.0);
    }
}
