//! Chart models for the report.
//!
//! A [`Chart`] is plain data: the same model is exported as SVG and drawn into
//! the PDF. Builders return `None` (with a logged notice) when their input is
//! empty.

pub mod svg;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::models::{PricePoint, RatioTable, Shareholder, BVPS_LABEL, EPS_LABEL, FISCAL_YEARS};
use crate::services::{ArtifactError, ArtifactStore};
use crate::utils::indicators::{normalize_closes, IndicatorSet, VolumeComparison};
use crate::utils::{format_iso_date, format_thousands, parse_number, Logger};

pub const TOP_SHAREHOLDERS_KIND: &str = "plot_top_shareholders";
pub const NORMALIZED_PRICE_KIND: &str = "draw_normalized_linegraph";
pub const VOLUME_COMPARISON_KIND: &str = "draw_volume_comparison";
pub const INDICATOR_KIND_PREFIX: &str = "plot_indicator_charts";
pub const RATIO_KIND_PREFIX: &str = "draw_chart";

pub const TOP_SHAREHOLDER_COUNT: usize = 5;
pub const RSI_UPPER_GUIDE: f64 = 80.0;
pub const RSI_LOWER_GUIDE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLUE: Rgb = Rgb(31, 119, 180);
    pub const ORANGE: Rgb = Rgb(255, 127, 14);
    pub const RED: Rgb = Rgb(214, 39, 40);
    pub const PURPLE: Rgb = Rgb(148, 103, 189);
    pub const GREEN: Rgb = Rgb(44, 160, 44);
    pub const GREY: Rgb = Rgb(127, 127, 127);

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

const PALETTE: [Rgb; 5] = [Rgb::BLUE, Rgb::ORANGE, Rgb::GREEN, Rgb::RED, Rgb::PURPLE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartStyle {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub color: Rgb,
    pub dashed: bool,
}

impl ChartSeries {
    pub fn new(name: &str, values: Vec<Option<f64>>, color: Rgb) -> Self {
        Self {
            name: name.to_string(),
            values,
            color,
            dashed: false,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// Horizontal reference line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Artifact kind, also used in the exported file name
    pub kind: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_labels: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub guides: Vec<GuideLine>,
    pub style: ChartStyle,
}

impl Chart {
    pub fn new(kind: &str, title: &str, x_label: &str, y_label: &str, style: ChartStyle) -> Self {
        Self {
            kind: kind.to_string(),
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            x_labels: Vec::new(),
            series: Vec::new(),
            guides: Vec::new(),
            style,
        }
    }

    pub fn with_x_labels(mut self, labels: Vec<String>) -> Self {
        self.x_labels = labels;
        self
    }

    pub fn with_series(mut self, series: ChartSeries) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_guide(mut self, value: f64, label: &str) -> Self {
        self.guides.push(GuideLine {
            value,
            label: label.to_string(),
        });
        self
    }

    pub fn has_data(&self) -> bool {
        self.series
            .iter()
            .any(|s| s.values.iter().any(|v| v.is_some_and(f64::is_finite)))
    }

    /// Y range covering every value and guide with a 10% margin.
    /// Bar charts always include zero.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let values = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().flatten().copied())
            .chain(self.guides.iter().map(|g| g.value))
            .filter(|v| v.is_finite());
        let (mut min, mut max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !min.is_finite() {
            return None;
        }
        if self.style == ChartStyle::Bar {
            min = min.min(0.0);
            max = max.max(0.0);
        }
        let margin = if max > min { 0.1 * (max - min) } else { 1.0 };
        Some((min - margin, max + margin))
    }

    /// Column chart of the first series for terminal previews
    pub fn text_preview(&self, width: usize, height: usize) -> Vec<String> {
        let values: Vec<f64> = self
            .series
            .first()
            .map(|s| s.values.iter().flatten().copied().filter(|v| v.is_finite()).collect())
            .unwrap_or_default();
        if values.is_empty() || width == 0 || height == 0 {
            return vec!["No data".to_string()];
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if (max - min).abs() < f64::EPSILON {
            return vec!["─".repeat(width.min(values.len())); height];
        }

        let step = values.len().div_ceil(width);
        let columns: Vec<f64> = values.iter().step_by(step).copied().collect();
        let mut grid = vec![vec![' '; columns.len()]; height];
        for (i, v) in columns.iter().enumerate() {
            let normalized = (v - min) / (max - min);
            let row = (((1.0 - normalized) * (height - 1) as f64).round() as usize).min(height - 1);
            grid[row][i] = '█';
        }
        grid.into_iter().map(|row| row.into_iter().collect()).collect()
    }
}

/// How charts are exported; passed explicitly to every export call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Write files only, no terminal preview
    pub headless: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1200,
            height: 600,
        }
    }
}

fn date_labels(dates: &[NaiveDate]) -> Vec<String> {
    dates.iter().map(|d| format_iso_date(*d)).collect()
}

fn to_options(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|v| Some(*v)).collect()
}

/// Bar chart of the largest holders, ownership in percent
pub fn top_shareholders(ticker: &str, shareholders: &[Shareholder]) -> Option<Chart> {
    if shareholders.is_empty() {
        Logger::new("CHARTS").info(&format!("ℹ️ No shareholder data for {}", ticker));
        return None;
    }
    let mut sorted = shareholders.to_vec();
    sorted.sort_by(|a, b| b.own_percent.total_cmp(&a.own_percent));
    sorted.truncate(TOP_SHAREHOLDER_COUNT);

    let title = format!("Top {} cổ đông của {}", TOP_SHAREHOLDER_COUNT, ticker);
    Some(
        Chart::new(TOP_SHAREHOLDERS_KIND, &title, "Cổ đông", "Phần trăm sở hữu", ChartStyle::Bar)
            .with_x_labels(sorted.iter().map(|s| s.name.clone()).collect())
            .with_series(ChartSeries::new(
                "Tỷ lệ sở hữu (%)",
                sorted.iter().map(|s| Some(s.own_percent * 100.0)).collect(),
                Rgb::BLUE,
            )),
    )
}

/// Stock and exchange index closes, each divided by its first close
pub fn normalized_price(
    ticker: &str,
    exchange_name: &str,
    stock: &[PricePoint],
    index: &[PricePoint],
) -> Option<Chart> {
    let normalized_stock = normalize_closes(stock);
    if normalized_stock.is_empty() {
        Logger::new("CHARTS").info(&format!("ℹ️ No price history for {}", ticker));
        return None;
    }
    let title = format!("Diễn biến giá của cổ phiếu {} so với sàn {}", ticker, exchange_name);
    let dates: Vec<NaiveDate> = normalized_stock.iter().map(|(d, _)| *d).collect();
    let mut chart = Chart::new(NORMALIZED_PRICE_KIND, &title, "Thời gian", "Mức độ tăng giảm", ChartStyle::Line)
        .with_x_labels(date_labels(&dates))
        .with_series(ChartSeries::new(
            ticker,
            normalized_stock.iter().map(|(_, v)| Some(*v)).collect(),
            Rgb::BLUE,
        ));

    let normalized_index: HashMap<NaiveDate, f64> = normalize_closes(index).into_iter().collect();
    if !normalized_index.is_empty() {
        chart = chart.with_series(ChartSeries::new(
            exchange_name,
            dates.iter().map(|d| normalized_index.get(d).copied()).collect(),
            Rgb::RED,
        ));
    }
    Some(chart)
}

pub fn volume_comparison(ticker: &str, comparison: &VolumeComparison) -> Chart {
    let title = format!("So sánh khối lượng giao dịch của {} với các mốc thời gian", ticker);
    Chart::new(VOLUME_COMPARISON_KIND, &title, "Khoảng thời gian", "Khối lượng giao dịch", ChartStyle::Bar)
        .with_x_labels(vec![
            format_iso_date(comparison.reference_date),
            "1 Week Avg".to_string(),
            "1 Month Avg".to_string(),
            "3 Month Avg".to_string(),
        ])
        .with_series(ChartSeries::new(
            "Khối lượng",
            vec![
                Some(comparison.day),
                Some(comparison.week_avg),
                Some(comparison.month_avg),
                Some(comparison.three_month_avg),
            ],
            Rgb::BLUE,
        ))
}

/// SMA, RSI, Bollinger and MACD charts in that order
pub fn indicator_charts(indicators: &IndicatorSet) -> Vec<Chart> {
    if indicators.is_empty() {
        Logger::new("CHARTS").info("ℹ️ No close prices, skipping indicator charts");
        return Vec::new();
    }
    let labels = date_labels(&indicators.dates);
    let close = to_options(&indicators.close);
    let kind = |n: usize| format!("{}_{}", INDICATOR_KIND_PREFIX, n);

    let sma = Chart::new(&kind(1), "Giá đóng cửa với SMA20 và SMA50", "Thời gian", "Giá", ChartStyle::Line)
        .with_x_labels(labels.clone())
        .with_series(ChartSeries::new("Close", close.clone(), Rgb::BLUE))
        .with_series(ChartSeries::new("SMA 20", indicators.sma_short.values.clone(), Rgb::ORANGE))
        .with_series(ChartSeries::new("SMA 50", indicators.sma_long.values.clone(), Rgb::PURPLE));

    let rsi = Chart::new(&kind(2), "Chỉ báo RSI", "Thời gian", "Thang đo", ChartStyle::Line)
        .with_x_labels(labels.clone())
        .with_series(ChartSeries::new("RSI", indicators.rsi.values.clone(), Rgb::PURPLE))
        .with_guide(RSI_UPPER_GUIDE, "Mức 80")
        .with_guide(RSI_LOWER_GUIDE, "Mức 20");

    let bollinger = Chart::new(&kind(3), "Bollinger Bands", "Thời gian", "Thang đo", ChartStyle::Line)
        .with_x_labels(labels.clone())
        .with_series(ChartSeries::new("Close", close, Rgb::RED))
        .with_series(ChartSeries::new("SMA (Bollinger)", indicators.bollinger.middle.clone(), Rgb::ORANGE))
        .with_series(ChartSeries::new("Upper Band", indicators.bollinger.upper.clone(), Rgb::BLUE).dashed())
        .with_series(ChartSeries::new("Lower Band", indicators.bollinger.lower.clone(), Rgb::BLUE).dashed());

    let macd = Chart::new(&kind(4), "MACD", "Thời gian", "Thang đo", ChartStyle::Line)
        .with_x_labels(labels)
        .with_series(ChartSeries::new("MACD", to_options(&indicators.macd.macd), Rgb::BLUE))
        .with_series(ChartSeries::new("Signal Line", to_options(&indicators.macd.signal), Rgb::RED));

    vec![sma, rsi, bollinger, macd]
}

struct RatioGroup {
    title: &'static str,
    y_label: &'static str,
    labels: &'static [&'static str],
    style: ChartStyle,
}

const RATIO_GROUPS: [RatioGroup; 8] = [
    RatioGroup {
        title: "Chỉ tiêu cơ cấu nguồn vốn",
        y_label: "Mức độ tăng trưởng (lần)",
        labels: &["(Vay NH+DH)/VCSH", "Nợ/VCSH", "TSCĐ / Vốn CSH", "Vốn CSH/Vốn điều lệ"],
        style: ChartStyle::Line,
    },
    RatioGroup {
        title: "Chỉ tiêu khả năng sinh lời",
        y_label: "Mức độ tăng trưởng (%)",
        labels: &["Biên lợi nhuận ròng (%)", "Biên lợi nhuận gộp (%)", "ROE (%)", "ROA (%)"],
        style: ChartStyle::Line,
    },
    RatioGroup {
        title: "Chỉ tiêu hiệu quả hoạt động",
        y_label: "Mức độ tăng trưởng (lần)",
        labels: &[
            "Số ngày thu tiền bình quân",
            "Số ngày tồn kho bình quân",
            "Số ngày thanh toán bình quân",
        ],
        style: ChartStyle::Line,
    },
    RatioGroup {
        title: "Chỉ tiêu thanh khoản",
        y_label: "Mức độ tăng trưởng (lần)",
        labels: &[
            "Chỉ số thanh toán nhanh",
            "Đòn bẩy tài chính",
            "Chỉ số thanh toán hiện thời",
            "Khả năng chi trả lãi vay",
        ],
        style: ChartStyle::Line,
    },
    RatioGroup {
        title: "Chỉ tiêu định giá P/E",
        y_label: "Mức độ tăng trưởng (lần)",
        labels: &["P/E"],
        style: ChartStyle::Bar,
    },
    RatioGroup {
        title: "Chỉ tiêu định giá P/B",
        y_label: "Mức độ tăng trưởng (lần)",
        labels: &["P/B"],
        style: ChartStyle::Bar,
    },
    RatioGroup {
        title: "Chỉ tiêu định giá EPS",
        y_label: "Số tiền lời trên 1 cổ phiếu (VND)",
        labels: &[EPS_LABEL],
        style: ChartStyle::Line,
    },
    RatioGroup {
        title: "Chỉ tiêu định giá BVPS",
        y_label: "Giá trị sổ sách của 1 cổ phiếu (VND)",
        labels: &[BVPS_LABEL],
        style: ChartStyle::Line,
    },
];

/// Ratio value as plotted; per-share values are shown in thousands
fn chart_value(table: &RatioTable, year: u16, label: &str) -> Option<f64> {
    let value = table.cell(&year.to_string(), label).and_then(parse_number)?;
    if label == EPS_LABEL || label == BVPS_LABEL {
        let thousands = value / 1000.0;
        Some((thousands * 1000.0).round() / 1000.0)
    } else {
        Some(value)
    }
}

/// One chart per ratio group, `draw_chart_1..8`; groups without data are skipped
pub fn ratio_charts(table: &RatioTable) -> Vec<Chart> {
    let logger = Logger::new("CHARTS");
    let years: Vec<String> = FISCAL_YEARS.iter().map(|y| y.to_string()).collect();

    RATIO_GROUPS
        .iter()
        .enumerate()
        .filter_map(|(i, group)| {
            let kind = format!("{}_{}", RATIO_KIND_PREFIX, i + 1);
            let mut chart = Chart::new(&kind, group.title, "Năm", group.y_label, group.style)
                .with_x_labels(years.clone());
            let present = group.labels.iter().filter(|label| table.labels.iter().any(|l| l == *label));
            for (n, label) in present.enumerate() {
                let values = FISCAL_YEARS.iter().map(|year| chart_value(table, *year, label)).collect();
                chart = chart.with_series(ChartSeries::new(label, values, PALETTE[n % PALETTE.len()]));
            }
            if chart.has_data() {
                Some(chart)
            } else {
                logger.info(&format!("ℹ️ No data for {} ({})", group.title, kind));
                None
            }
        })
        .collect()
}

/// Write each chart as SVG and record it; prints a text preview unless headless
pub fn export_charts(
    store: &ArtifactStore,
    ticker: &str,
    charts: &[Chart],
    config: &RenderConfig,
) -> Result<Vec<PathBuf>, ArtifactError> {
    let logger = Logger::new("CHARTS");
    let mut paths = Vec::with_capacity(charts.len());
    for chart in charts {
        let document = svg::render(chart, config);
        let path = store.write_bytes(ticker, &chart.kind, "svg", document.as_bytes())?;
        if !config.headless {
            let preview = chart.text_preview(60, 8).join("\n");
            logger.info(&format!("📈 {}\n{}", chart.title, preview));
        }
        paths.push(path);
    }
    logger.info(&format!("✅ Exported {} charts for {}", paths.len(), ticker));
    Ok(paths)
}

/// Bar value label, `12,345` style for large values
pub fn value_label(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format_thousands(value)
    } else {
        format!("{:.2}", value)
    }
}
