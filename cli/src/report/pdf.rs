use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{ReportContent, NO_SUBSIDIARIES_TEXT, VALUATION_METHOD_TEXT, VALUATION_METHOD_TITLE};
use crate::charts::svg::{segments, Frame};
use crate::charts::{value_label, Chart, ChartStyle, Rgb as ChartColor};
use crate::models::TidyTable;
use crate::utils::{log_artifact, to_ascii, wrap_text, Logger, Timer};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const CONTENT_TOP: f32 = 42.0;
const CONTENT_BOTTOM: f32 = PAGE_HEIGHT - 16.0;
const CHART_HEIGHT: f32 = 85.0;
const PT_TO_MM: f32 = 0.3528;

const NAVY: (u8, u8, u8) = (0, 0, 128);
const ROW_FILL: (u8, u8, u8) = (230, 240, 250);
const WHITE: (u8, u8, u8) = (255, 255, 255);
const BLACK: (u8, u8, u8) = (0, 0, 0);

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pdf error: {0}")]
    Pdf(String),
}

fn color((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, None))
}

fn chart_color(c: ChartColor) -> (u8, u8, u8) {
    (c.0, c.1, c.2)
}

/// Approximate rendered width of `text` in mm
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * PT_TO_MM * 0.5
}

fn chars_per_line(width: f32, size: f32) -> usize {
    ((width / (size * PT_TO_MM * 0.5)) as usize).max(1)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Page-flowing writer; `y` is measured in mm from the top of the page
struct ReportWriter {
    doc: PdfDocumentReference,
    layers: Vec<PdfLayerReference>,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    ascii_only: bool,
    header: [String; 4],
    y: f32,
}

impl ReportWriter {
    fn new(title: &str, header: [String; 4], font_path: Option<&Path>) -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let (font, bold, ascii_only) = match font_path {
            Some(path) => {
                let file = File::open(path).map_err(|source| ReportError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let font = doc.add_external_font(file).map_err(|e| ReportError::Pdf(e.to_string()))?;
                (font.clone(), font, false)
            }
            None => {
                let font = doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| ReportError::Pdf(e.to_string()))?;
                let bold = doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(|e| ReportError::Pdf(e.to_string()))?;
                (font, bold, true)
            }
        };
        let first = doc.get_page(page).get_layer(layer);
        let writer = Self {
            doc,
            layers: vec![first],
            font,
            bold,
            ascii_only,
            header,
            y: CONTENT_TOP,
        };
        writer.draw_page_header();
        Ok(writer)
    }

    fn layer(&self) -> &PdfLayerReference {
        // at least one page always exists
        &self.layers[self.layers.len() - 1]
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layers.push(self.doc.get_page(page).get_layer(layer));
        self.y = CONTENT_TOP;
        self.draw_page_header();
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y + height > CONTENT_BOTTOM {
            self.new_page();
        }
    }

    fn text_at(&self, text: &str, size: f32, x: f32, y: f32, bold: bool, rgb: (u8, u8, u8)) {
        let shown = if self.ascii_only { to_ascii(text) } else { text.to_string() };
        let font = if bold { &self.bold } else { &self.font };
        let layer = self.layer();
        layer.set_fill_color(color(rgb));
        layer.use_text(shown, size, Mm(x), Mm(PAGE_HEIGHT - y), font);
    }

    fn fill_rect(&self, x: f32, y: f32, width: f32, height: f32, rgb: (u8, u8, u8)) {
        let corner = |cx: f32, cy: f32| (Point::new(Mm(cx), Mm(PAGE_HEIGHT - cy)), false);
        let layer = self.layer();
        layer.set_fill_color(color(rgb));
        layer.add_polygon(Polygon {
            rings: vec![vec![
                corner(x, y),
                corner(x + width, y),
                corner(x + width, y + height),
                corner(x, y + height),
            ]],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn polyline(&self, points: &[(f32, f32)], rgb: (u8, u8, u8), thickness: f32) {
        if points.len() < 2 {
            return;
        }
        let layer = self.layer();
        layer.set_outline_color(color(rgb));
        layer.set_outline_thickness(thickness);
        layer.add_line(Line {
            points: points
                .iter()
                .map(|(x, y)| (Point::new(Mm(*x), Mm(PAGE_HEIGHT - *y)), false))
                .collect(),
            is_closed: false,
        });
    }

    fn draw_page_header(&self) {
        let header = &self.header;
        self.text_at(&header[0], 10.0, MARGIN, 14.0, true, BLACK);
        self.text_at(&header[1], 8.0, MARGIN, 20.0, false, BLACK);
        self.text_at(&header[2], 8.0, MARGIN, 25.0, false, BLACK);
        self.text_at(&header[3], 8.0, MARGIN, 30.0, false, BLACK);
        self.polyline(&[(MARGIN, 34.0), (PAGE_WIDTH - MARGIN, 34.0)], NAVY, 1.4);
    }

    fn draw_footers(&self) {
        let total = self.layers.len();
        for (i, layer) in self.layers.iter().enumerate() {
            let label = format!("Trang {} / {}", i + 1, total);
            let bottom = |cx: f32, cy: f32| (Point::new(Mm(cx), Mm(cy)), false);
            layer.set_fill_color(color(NAVY));
            layer.add_polygon(Polygon {
                rings: vec![vec![bottom(0.0, 0.0), bottom(PAGE_WIDTH, 0.0), bottom(PAGE_WIDTH, 10.0), bottom(0.0, 10.0)]],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            });
            layer.set_fill_color(color(WHITE));
            let x = (PAGE_WIDTH - text_width(&label, 8.0)) / 2.0;
            layer.use_text(label, 8.0, Mm(x), Mm(4.0), &self.font);
        }
    }

    fn section_header(&mut self, title: &str, centered: bool) {
        self.ensure_space(16.0);
        self.fill_rect(MARGIN, self.y, CONTENT_WIDTH, 10.0, NAVY);
        let x = if centered {
            MARGIN + (CONTENT_WIDTH - text_width(title, 10.0)) / 2.0
        } else {
            MARGIN + 2.0
        };
        self.text_at(title, 10.0, x, self.y + 6.5, true, WHITE);
        self.y += 13.0;
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(8.0);
        self.text_at(text, 10.0, MARGIN, self.y + 4.0, true, BLACK);
        self.y += 7.0;
    }

    fn paragraph(&mut self, text: &str) {
        let per_line = chars_per_line(CONTENT_WIDTH, 8.0);
        for raw_line in text.lines() {
            for line in wrap_text(raw_line, per_line) {
                self.ensure_space(5.0);
                self.text_at(&line, 8.0, MARGIN, self.y + 3.5, false, BLACK);
                self.y += 5.0;
            }
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y += mm;
    }

    /// Rows of wrapped cells in equal-width columns
    fn grid(&mut self, headers: &[&str], rows: &[Vec<String>]) {
        let column_width = CONTENT_WIDTH / headers.len() as f32;
        self.ensure_space(7.0);
        for (i, header) in headers.iter().enumerate() {
            self.text_at(header, 10.0, MARGIN + column_width * i as f32, self.y + 5.0, true, BLACK);
        }
        self.y += 7.0;

        let per_line = chars_per_line(column_width - 2.0, 8.0);
        for row in rows {
            let wrapped: Vec<Vec<String>> = row.iter().map(|cell| wrap_text(cell, per_line)).collect();
            let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let height = lines as f32 * 5.0;
            self.ensure_space(height + 3.0);
            for (i, cell_lines) in wrapped.iter().enumerate() {
                for (n, line) in cell_lines.iter().enumerate() {
                    let y = self.y + 3.5 + n as f32 * 5.0;
                    self.text_at(line, 8.0, MARGIN + column_width * i as f32, y, false, BLACK);
                }
            }
            self.y += height + 3.0;
        }
    }

    /// Label column plus one right-aligned column per year, alternating row fill
    fn statement_table(&mut self, title: &str, table: &TidyTable) {
        let label_width = CONTENT_WIDTH * 0.35;
        let year_width = CONTENT_WIDTH * 0.65 / table.years.len().max(1) as f32;
        let label_chars = chars_per_line(label_width - 2.0, 8.0);

        self.ensure_space(12.0);
        self.fill_rect(MARGIN, self.y, CONTENT_WIDTH, 6.0, NAVY);
        self.text_at(title, 10.0, MARGIN + 1.0, self.y + 4.5, true, WHITE);
        for (i, year) in table.years.iter().enumerate() {
            let label = year.to_string();
            let right = MARGIN + label_width + year_width * (i + 1) as f32 - 1.0;
            self.text_at(&label, 10.0, right - text_width(&label, 10.0), self.y + 4.5, true, WHITE);
        }
        self.y += 6.0;

        for (n, row) in table.rows.iter().enumerate() {
            self.ensure_space(6.0);
            if n % 2 == 0 {
                self.fill_rect(MARGIN, self.y, CONTENT_WIDTH, 6.0, ROW_FILL);
            }
            self.text_at(&truncate(&row.label, label_chars), 8.0, MARGIN + 1.0, self.y + 4.2, false, BLACK);
            for (i, cell) in row.cells.iter().enumerate() {
                let value = cell.as_deref().unwrap_or("");
                let right = MARGIN + label_width + year_width * (i + 1) as f32 - 1.0;
                self.text_at(value, 8.0, right - text_width(value, 8.0), self.y + 4.2, false, BLACK);
            }
            self.y += 6.0;
        }
        self.y += 5.0;
    }

    fn chart(&mut self, chart: &Chart) {
        self.ensure_space(CHART_HEIGHT + 4.0);
        let top = self.y;
        let title_chars = chars_per_line(CONTENT_WIDTH, 9.0);
        self.text_at(&truncate(&chart.title, title_chars), 9.0, MARGIN, top + 4.0, true, BLACK);

        let plot_left = MARGIN + 18.0;
        let plot_top = top + 8.0;
        let plot_width = CONTENT_WIDTH - 20.0;
        let plot_height = CHART_HEIGHT - 24.0;
        let Some(frame) = Frame::new(
            plot_left as f64,
            plot_top as f64,
            plot_width as f64,
            plot_height as f64,
            chart,
        ) else {
            self.text_at("No data", 8.0, MARGIN, top + 12.0, false, BLACK);
            self.y += 16.0;
            return;
        };
        let px = |i: usize| frame.x(i) as f32;
        let py = |v: f64| frame.y(v) as f32;

        let (left, right) = (plot_left, plot_left + plot_width);
        let bottom = plot_top + plot_height;
        self.polyline(&[(left, plot_top), (left, bottom), (right, bottom)], BLACK, 0.5);
        for tick in frame.y_ticks() {
            let y = py(tick);
            self.polyline(&[(left, y), (right, y)], (210, 210, 210), 0.3);
            let label = value_label(tick);
            self.text_at(&label, 6.0, left - 1.0 - text_width(&label, 6.0), y + 1.0, false, BLACK);
        }
        for i in frame.x_tick_indices() {
            if let Some(label) = chart.x_labels.get(i) {
                let label = truncate(label, 12);
                self.text_at(&label, 6.0, px(i) - text_width(&label, 6.0) / 2.0, bottom + 4.0, false, BLACK);
            }
        }
        self.text_at(&chart.x_label, 7.0, left + plot_width / 2.0, bottom + 9.0, false, BLACK);
        self.text_at(&truncate(&chart.y_label, 40), 6.0, MARGIN, plot_top - 1.5, false, BLACK);

        for guide in &chart.guides {
            let y = py(guide.value);
            self.polyline(&[(left, y), (right, y)], chart_color(ChartColor::PURPLE), 0.6);
            self.text_at(&guide.label, 6.0, right - text_width(&guide.label, 6.0), y - 1.0, false, BLACK);
        }

        match chart.style {
            ChartStyle::Line => {
                for series in &chart.series {
                    let thickness = if series.dashed { 0.5 } else { 1.0 };
                    for run in segments(&series.values) {
                        let points: Vec<(f32, f32)> = run.iter().map(|(i, v)| (px(*i), py(*v))).collect();
                        self.polyline(&points, chart_color(series.color), thickness);
                    }
                }
            }
            ChartStyle::Bar => {
                let bar_width = frame.slot_width() as f32 * 0.6;
                let zero = py(0.0);
                if let Some(series) = chart.series.first() {
                    for (i, value) in series.values.iter().enumerate() {
                        let Some(value) = value.filter(|v| v.is_finite()) else {
                            continue;
                        };
                        let y = py(value);
                        let top = y.min(zero);
                        self.fill_rect(px(i) - bar_width / 2.0, top, bar_width, (zero - y).abs(), chart_color(series.color));
                        let label = value_label(value);
                        self.text_at(&label, 6.0, px(i) - text_width(&label, 6.0) / 2.0, top - 1.0, false, BLACK);
                    }
                }
            }
        }

        for (n, series) in chart.series.iter().enumerate() {
            let y = plot_top + 3.0 + n as f32 * 3.5;
            let x = left + 3.0;
            self.polyline(&[(x, y), (x + 5.0, y)], chart_color(series.color), 1.2);
            self.text_at(&truncate(&series.name, 40), 6.0, x + 6.5, y + 1.0, false, BLACK);
        }

        self.y = top + CHART_HEIGHT + 4.0;
    }

    fn chart_group(&mut self, title: &str, charts: &[Chart]) {
        if charts.is_empty() {
            return;
        }
        self.heading(title);
        for chart in charts {
            self.chart(chart);
        }
    }

    fn save(self, path: &Path) -> Result<(), ReportError> {
        self.draw_footers();
        let file = File::create(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| ReportError::Pdf(e.to_string()))
    }
}

/// Render the report under `export_dir` and return the written path
pub fn write_report(
    content: &ReportContent,
    export_dir: &Path,
    font_path: Option<&Path>,
) -> Result<PathBuf, ReportError> {
    let logger = Logger::new("REPORT");
    let timer = Timer::start("pdf report");
    fs::create_dir_all(export_dir).map_err(|source| ReportError::Io {
        path: export_dir.to_path_buf(),
        source,
    })?;
    let path = export_dir.join(content.file_name());

    let title = format!("Report {}", content.header.ticker);
    let mut writer = ReportWriter::new(&title, content.header.lines(), font_path)?;

    writer.heading("Giới thiệu");
    writer.paragraph(&content.introduction);
    writer.gap(5.0);

    writer.section_header("Thông tin cơ bản", false);
    for (label, value) in content.basic_information() {
        writer.heading(label);
        writer.paragraph(&value);
        writer.gap(4.0);
    }

    writer.section_header("Ban lãnh đạo", false);
    let executives: Vec<Vec<String>> = content.executive_rows().into_iter().map(Vec::from).collect();
    writer.grid(&["Tên cán bộ", "Tên chức vụ rút gọn", "Tỷ lệ sở hữu", "Số lượng"], &executives);

    writer.section_header("Danh sách công ty con, liên kết", false);
    let subsidiaries: Vec<Vec<String>> = content.subsidiary_rows().into_iter().map(Vec::from).collect();
    if subsidiaries.is_empty() {
        writer.paragraph(NO_SUBSIDIARIES_TEXT);
    } else {
        writer.grid(&["Tên công ty con", "Tỷ lệ sở hữu"], &subsidiaries);
    }
    writer.gap(3.0);

    for (title, table) in content.tables() {
        writer.statement_table(title, table);
    }

    writer.section_header(VALUATION_METHOD_TITLE, true);
    writer.heading("Giới thiệu phương pháp:");
    writer.paragraph(VALUATION_METHOD_TEXT);
    writer.gap(3.0);
    writer.heading("Mức giá sau khi sử dụng kết hợp P/E và P/B");
    writer.paragraph(&content.valuation_line());
    writer.gap(5.0);

    writer.section_header("Phân tích tin tức vĩ mô ảnh hưởng đến cổ phiếu", true);
    writer.paragraph(&content.macro_news);
    writer.gap(3.0);

    writer.section_header("Phân tích kỹ thuật", true);
    writer.chart_group("Nhóm 1: Top 5 cổ đông", &content.shareholder_charts);
    writer.chart_group("Nhóm 2: Các chỉ số phân tích kỹ thuật", &content.technical_charts);
    writer.chart_group("Nhóm 3: Các chỉ số đánh giá doanh nghiệp", &content.ratio_charts);

    let pages = writer.layers.len();
    writer.save(&path)?;
    log_artifact(&format!("📄 {} ({} pages)", path.display(), pages));
    logger.info(&format!("✅ Report for {} written", content.header.ticker));
    timer.log_elapsed("REPORT");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartSeries, ChartStyle};
    use crate::report::ReportHeader;
    use crate::models::Subsidiary;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn content() -> ReportContent {
        let at = chrono_tz::Asia::Ho_Chi_Minh.with_ymd_and_hms(2025, 4, 1, 9, 5, 0).unwrap();
        let mut content = ReportContent::new(ReportHeader::new("GEX", None, at));
        content.introduction = "GEX là tập đoàn đa ngành.".to_string();
        content.macro_news = "Lãi suất: ổn định\nTỷ giá: tăng nhẹ".to_string();
        content.subsidiaries = vec![Subsidiary {
            name: "GELEX Electric".into(),
            own_percent: 0.8,
        }];
        content.ratio_charts = vec![Chart::new("draw_chart_5", "Chỉ tiêu định giá P/E", "Năm", "lần", ChartStyle::Bar)
            .with_x_labels(vec!["2023".into(), "2024".into()])
            .with_series(ChartSeries::new("P/E", vec![Some(10.0), Some(12.0)], ChartColor::BLUE))];
        content
    }

    #[test]
    fn test_truncate_and_widths() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long shareholder name", 10), "a long ...");
        assert!(chars_per_line(CONTENT_WIDTH, 8.0) > 100);
    }

    #[test]
    fn test_write_report_creates_pdf() {
        let dir = TempDir::new().unwrap();
        let path = write_report(&content(), dir.path(), None).unwrap();
        assert_eq!(path.file_name().unwrap(), "Report_GEX_20250401_0905.pdf");
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_font_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.ttf");
        let result = write_report(&content(), dir.path(), Some(&missing));
        assert!(matches!(result, Err(ReportError::Io { .. })));
    }
}
