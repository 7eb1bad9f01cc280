use std::fmt::Write;

use super::{value_label, Chart, ChartStyle, RenderConfig, Rgb};

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;
const Y_TICKS: usize = 5;
const MAX_X_TICKS: usize = 12;

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Plot area geometry shared by the SVG and PDF renderers
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub points: usize,
}

impl Frame {
    pub fn new(left: f64, top: f64, width: f64, height: f64, chart: &Chart) -> Option<Self> {
        let (y_min, y_max) = chart.value_range()?;
        let points = chart
            .series
            .iter()
            .map(|s| s.values.len())
            .max()
            .unwrap_or(0)
            .max(chart.x_labels.len());
        (points > 0).then_some(Self {
            left,
            top,
            width,
            height,
            y_min,
            y_max,
            points,
        })
    }

    /// Center of slot `i`
    pub fn x(&self, i: usize) -> f64 {
        let slot = self.width / self.points as f64;
        self.left + slot * (i as f64 + 0.5)
    }

    pub fn y(&self, value: f64) -> f64 {
        let ratio = (value - self.y_min) / (self.y_max - self.y_min);
        self.top + self.height * (1.0 - ratio)
    }

    pub fn slot_width(&self) -> f64 {
        self.width / self.points as f64
    }

    pub fn y_ticks(&self) -> Vec<f64> {
        (0..=Y_TICKS)
            .map(|i| self.y_min + (self.y_max - self.y_min) * i as f64 / Y_TICKS as f64)
            .collect()
    }

    /// Indices of x labels to draw so at most `MAX_X_TICKS` appear
    pub fn x_tick_indices(&self) -> Vec<usize> {
        let step = self.points.div_ceil(MAX_X_TICKS).max(1);
        (0..self.points).step_by(step).collect()
    }
}

/// Connected runs of present values, split at gaps
pub fn segments(values: &[Option<f64>]) -> Vec<Vec<(usize, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, value) in values.iter().enumerate() {
        match value.filter(|v| v.is_finite()) {
            Some(v) => current.push((i, v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn text(out: &mut String, x: f64, y: f64, size: u32, anchor: &str, content: &str) {
    let _ = writeln!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="{}" text-anchor="{}" font-family="sans-serif">{}</text>"#,
        x,
        y,
        size,
        anchor,
        escape(content)
    );
}

/// Standalone SVG document for `chart`
pub fn render(chart: &Chart, config: &RenderConfig) -> String {
    let width = config.width as f64;
    let height = config.height as f64;
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = config.width,
        h = config.height
    );
    let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#);
    text(&mut out, width / 2.0, 32.0, 20, "middle", &chart.title);

    let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = height - MARGIN_TOP - MARGIN_BOTTOM;
    let Some(frame) = Frame::new(MARGIN_LEFT, MARGIN_TOP, plot_width, plot_height, chart) else {
        text(&mut out, width / 2.0, height / 2.0, 16, "middle", "No data");
        out.push_str("</svg>\n");
        return out;
    };

    let grey = Rgb::GREY.hex();
    for tick in frame.y_ticks() {
        let y = frame.y(tick);
        let _ = writeln!(
            out,
            r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{grey}" stroke-opacity="0.3" stroke-dasharray="4 4"/>"#,
            frame.left,
            frame.left + frame.width,
        );
        text(&mut out, frame.left - 8.0, y + 4.0, 12, "end", &value_label(tick));
    }
    let _ = writeln!(
        out,
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="black"/>"#,
        frame.left, frame.top, frame.width, frame.height
    );

    for i in frame.x_tick_indices() {
        if let Some(label) = chart.x_labels.get(i) {
            text(&mut out, frame.x(i), frame.top + frame.height + 18.0, 11, "middle", label);
        }
    }
    text(&mut out, frame.left + frame.width / 2.0, height - 16.0, 14, "middle", &chart.x_label);
    let _ = writeln!(
        out,
        r#"<text transform="translate(20 {:.1}) rotate(-90)" font-size="14" text-anchor="middle" font-family="sans-serif">{}</text>"#,
        frame.top + frame.height / 2.0,
        escape(&chart.y_label)
    );

    for guide in &chart.guides {
        let y = frame.y(guide.value);
        let _ = writeln!(
            out,
            r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{}" stroke-opacity="0.5" stroke-dasharray="8 4"/>"#,
            frame.left,
            frame.left + frame.width,
            Rgb::PURPLE.hex()
        );
        text(&mut out, frame.left + frame.width - 4.0, y - 4.0, 11, "end", &guide.label);
    }

    match chart.style {
        ChartStyle::Line => {
            for series in &chart.series {
                let dash = if series.dashed { r#" stroke-dasharray="6 4""# } else { "" };
                for run in segments(&series.values) {
                    let points: Vec<String> = run
                        .iter()
                        .map(|(i, v)| format!("{:.1},{:.1}", frame.x(*i), frame.y(*v)))
                        .collect();
                    let _ = writeln!(
                        out,
                        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"{}/>"#,
                        points.join(" "),
                        series.color.hex(),
                        dash
                    );
                }
            }
        }
        ChartStyle::Bar => {
            let bar_width = frame.slot_width() * 0.6;
            let zero = frame.y(0.0);
            if let Some(series) = chart.series.first() {
                for (i, value) in series.values.iter().enumerate() {
                    let Some(value) = value.filter(|v| v.is_finite()) else {
                        continue;
                    };
                    let y = frame.y(value);
                    let _ = writeln!(
                        out,
                        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                        frame.x(i) - bar_width / 2.0,
                        y.min(zero),
                        bar_width,
                        (zero - y).abs(),
                        series.color.hex()
                    );
                    text(&mut out, frame.x(i), y.min(zero) - 4.0, 11, "middle", &value_label(value));
                }
            }
        }
    }

    for (n, series) in chart.series.iter().enumerate() {
        let y = frame.top + 16.0 + n as f64 * 16.0;
        let x = frame.left + 12.0;
        let _ = writeln!(
            out,
            r#"<rect x="{:.1}" y="{:.1}" width="12" height="4" fill="{}"/>"#,
            x,
            y - 4.0,
            series.color.hex()
        );
        text(&mut out, x + 18.0, y + 2.0, 11, "start", &series.name);
    }

    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartSeries;

    #[test]
    fn test_segments_split_at_gaps() {
        let runs = segments(&[Some(1.0), None, Some(2.0), Some(3.0), None]);
        assert_eq!(runs, vec![vec![(0, 1.0)], vec![(2, 2.0), (3, 3.0)]]);
        assert!(segments(&[None, None]).is_empty());
    }

    #[test]
    fn test_frame_maps_range_to_pixels() {
        let chart = Chart::new("k", "t", "x", "y", ChartStyle::Line)
            .with_series(ChartSeries::new("s", vec![Some(0.0), Some(10.0)], Rgb::BLUE));
        let frame = Frame::new(0.0, 0.0, 100.0, 120.0, &chart).unwrap();
        // range is -1..11
        assert!((frame.y(11.0) - 0.0).abs() < 1e-9);
        assert!((frame.y(-1.0) - 120.0).abs() < 1e-9);
        assert!((frame.x(0) - 25.0).abs() < 1e-9);
        assert_eq!(frame.x_tick_indices(), vec![0, 1]);
    }

    #[test]
    fn test_render_escapes_text_and_draws_bars() {
        let chart = Chart::new("k", "P/E <2024> & more", "Năm", "lần", ChartStyle::Bar)
            .with_x_labels(vec!["2023".into(), "2024".into()])
            .with_series(ChartSeries::new("P/E", vec![Some(10.0), Some(12.5)], Rgb::BLUE));
        let svg = render(&chart, &RenderConfig::default());
        assert!(svg.contains("P/E &lt;2024&gt; &amp; more"));
        assert_eq!(svg.matches("fill=\"#1f77b4\"").count(), 3);
        assert!(svg.contains("12.50"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_render_empty_chart() {
        let chart = Chart::new("k", "Empty", "x", "y", ChartStyle::Line);
        assert!(render(&chart, &RenderConfig::default()).contains("No data"));
    }
}
