//! Report content assembly and PDF output

pub mod pdf;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::charts::Chart;
use crate::models::{
    CompanyOverview, CompanyProfile, IndustryClassification, Officer, StatementKind, Subsidiary,
    TidyTable, TICKER_ROW_LABEL,
};
use crate::services::{ArtifactError, ArtifactStore};
use crate::utils::{report_stamp, Valuation};

pub use pdf::{write_report, ReportError};

pub const EXECUTIVE_ROW_LIMIT: usize = 9;
pub const SUBSIDIARY_ROW_LIMIT: usize = 5;
pub const NO_SUBSIDIARIES_TEXT: &str = "Không có thông tin công ty con.";
pub const RATIO_TABLE_TITLE: &str = "Chỉ số tài chính";

pub const VALUATION_METHOD_TITLE: &str = "Phương pháp định giá cổ phiếu dựa trên P/E và P/B";
pub const VALUATION_METHOD_TEXT: &str = "Phương pháp P/E: Giá cổ phiếu = EPS * P/E (của ngành).\n\
Phương pháp P/B: Giá cổ phiếu = BVPS * P/B (của ngành).\n\
Giá định giá được tính bằng trung bình của 2 phương pháp, sau đó chia cho 1000.";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportHeader {
    pub ticker: String,
    pub exchange: String,
    pub company_name: String,
    pub industry: String,
    pub generated_at: DateTime<Tz>,
}

impl ReportHeader {
    pub fn new(ticker: &str, classification: Option<&IndustryClassification>, generated_at: DateTime<Tz>) -> Self {
        match classification {
            Some(c) => Self {
                ticker: ticker.to_uppercase(),
                exchange: c.exchange.clone(),
                company_name: c.company_name.clone(),
                industry: c.icb_level2.clone(),
                generated_at,
            },
            None => Self {
                ticker: ticker.to_uppercase(),
                exchange: String::new(),
                company_name: "UNKNOWN".to_string(),
                industry: String::new(),
                generated_at,
            },
        }
    }

    pub fn lines(&self) -> [String; 4] {
        [
            format!("{} ({})", self.ticker, self.exchange),
            format!("{} - {}", self.company_name, self.industry),
            format!("Ngày xuất báo cáo: {}", self.generated_at.format("%d/%m/%y")),
            format!("Thời gian xuất báo cáo: {}", self.generated_at.format("%H:%M")),
        ]
    }
}

/// Everything the PDF shows, already fetched and formatted
#[derive(Debug, Clone)]
pub struct ReportContent {
    pub header: ReportHeader,
    pub introduction: String,
    pub overview: Option<CompanyOverview>,
    pub profile: Option<CompanyProfile>,
    pub officers: Vec<Officer>,
    pub subsidiaries: Vec<Subsidiary>,
    /// Statement tables in report order, ticker row removed
    pub statements: Vec<(StatementKind, TidyTable)>,
    /// Ratios as rows, years as columns
    pub ratios: Option<TidyTable>,
    pub valuation: Option<Valuation>,
    pub macro_news: String,
    pub shareholder_charts: Vec<Chart>,
    pub technical_charts: Vec<Chart>,
    pub ratio_charts: Vec<Chart>,
}

impl ReportContent {
    pub fn new(header: ReportHeader) -> Self {
        Self {
            header,
            introduction: String::new(),
            overview: None,
            profile: None,
            officers: Vec::new(),
            subsidiaries: Vec::new(),
            statements: Vec::new(),
            ratios: None,
            valuation: None,
            macro_news: String::new(),
            shareholder_charts: Vec::new(),
            technical_charts: Vec::new(),
            ratio_charts: Vec::new(),
        }
    }

    /// `Report_{TICKER}_{yyyymmdd_HHMM}.pdf`
    pub fn file_name(&self) -> String {
        format!("Report_{}_{}.pdf", self.header.ticker, report_stamp(&self.header.generated_at))
    }

    /// Label and value pairs of the basic information section
    pub fn basic_information(&self) -> Vec<(&'static str, String)> {
        let overview = self.overview.clone().unwrap_or_default();
        let profile = self.profile.clone().unwrap_or_default();
        let count = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        vec![
            ("Trang chủ công ty", overview.website.unwrap_or_default()),
            ("Ngày thành lập", profile.history.unwrap_or_default()),
            ("Chìa khoá phát triển", profile.key_developments.unwrap_or_default()),
            ("Rủi ro kinh doanh", profile.business_risk.unwrap_or_default()),
            ("Chiến lược kinh doanh", profile.business_strategy.unwrap_or_default()),
            ("Số lượng cổ đông", count(overview.no_shareholders)),
            ("Số lượng nhân viên", count(overview.no_employees)),
        ]
    }

    pub fn executive_rows(&self) -> Vec<[String; 4]> {
        self.officers
            .iter()
            .take(EXECUTIVE_ROW_LIMIT)
            .map(|o| {
                [
                    o.name.clone(),
                    o.position.clone(),
                    o.own_percent.map(|p| format!("{:.4}", p)).unwrap_or_default(),
                    o.quantity.map(|q| q.to_string()).unwrap_or_default(),
                ]
            })
            .collect()
    }

    /// Largest holdings first
    pub fn subsidiary_rows(&self) -> Vec<[String; 2]> {
        let mut subs = self.subsidiaries.clone();
        subs.sort_by(|a, b| b.own_percent.total_cmp(&a.own_percent));
        subs.into_iter()
            .take(SUBSIDIARY_ROW_LIMIT)
            .map(|s| [s.name, format!("{:.4}", s.own_percent)])
            .collect()
    }

    /// Statement and ratio tables with their section titles
    pub fn tables(&self) -> Vec<(&str, &TidyTable)> {
        let mut tables: Vec<(&str, &TidyTable)> = self
            .statements
            .iter()
            .map(|(kind, table)| (kind.table_title(), table))
            .collect();
        if let Some(ratios) = &self.ratios {
            tables.push((RATIO_TABLE_TITLE, ratios));
        }
        tables
    }

    pub fn valuation_line(&self) -> String {
        let price = self.valuation.map(|v| v.price).unwrap_or(0.0);
        format!("Giá cổ phiếu định giá: {:.3} (VND)", price)
    }

    /// Latest statement and ratio artifacts for the ticker
    pub fn load_tables(&mut self, store: &ArtifactStore) -> Result<(), ArtifactError> {
        let ticker = self.header.ticker.clone();
        for kind in StatementKind::all() {
            if let Some(mut table) = store.read_statement(&ticker, kind)? {
                table.rows.retain(|row| row.label != TICKER_ROW_LABEL);
                self.statements.push((kind, table));
            }
        }
        self.ratios = store.read_ratios(&ticker)?.map(|table| table.transposed());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RatioRecord, WideRecord};
    use crate::utils::{build_ratio_table, reshape};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn header() -> ReportHeader {
        let at = chrono_tz::Asia::Ho_Chi_Minh.with_ymd_and_hms(2025, 4, 1, 9, 5, 0).unwrap();
        let classification = IndustryClassification {
            ticker: "GEX".into(),
            company_name: "Tập đoàn GELEX".into(),
            exchange: "HOSE".into(),
            icb_level1: "Công nghiệp".into(),
            icb_level2: "Hàng & Dịch vụ Công nghiệp".into(),
            icb_level3: String::new(),
            icb_level4: String::new(),
        };
        ReportHeader::new("gex", Some(&classification), at)
    }

    #[test]
    fn test_header_lines_and_file_name() {
        let content = ReportContent::new(header());
        let lines = content.header.lines();
        assert_eq!(lines[0], "GEX (HOSE)");
        assert_eq!(lines[1], "Tập đoàn GELEX - Hàng & Dịch vụ Công nghiệp");
        assert_eq!(lines[2], "Ngày xuất báo cáo: 01/04/25");
        assert_eq!(lines[3], "Thời gian xuất báo cáo: 09:05");
        assert_eq!(content.file_name(), "Report_GEX_20250401_0905.pdf");
    }

    #[test]
    fn test_subsidiaries_sorted_and_capped() {
        let mut content = ReportContent::new(header());
        content.subsidiaries = (1..=7)
            .map(|i| Subsidiary {
                name: format!("Sub {}", i),
                own_percent: i as f64 / 10.0,
            })
            .collect();
        let rows = content.subsidiary_rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0][0], "Sub 7");
    }

    #[test]
    fn test_executives_capped_at_nine() {
        let mut content = ReportContent::new(header());
        content.officers = (0..12)
            .map(|i| Officer {
                name: format!("Officer {}", i),
                position: "TV HĐQT".into(),
                own_percent: None,
                quantity: Some(100),
            })
            .collect();
        let rows = content.executive_rows();
        assert_eq!(rows.len(), EXECUTIVE_ROW_LIMIT);
        assert_eq!(rows[0][2], "");
        assert_eq!(rows[0][3], "100");
    }

    #[test]
    fn test_load_tables_drops_ticker_row() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let record = WideRecord::new().with("Mã", "GEX").with("Nợ ngắn hạn", "2000");
        let table = reshape(&record, StatementKind::BalanceSheet.line_items());
        store.write_statement("GEX", StatementKind::BalanceSheet, &table).unwrap();
        store
            .write_ratios(&build_ratio_table("GEX", &[RatioRecord::new(2024).with("priceToEarning", 9.5)]))
            .unwrap();

        let mut content = ReportContent::new(header());
        content.load_tables(&store).unwrap();
        assert_eq!(content.statements.len(), 1);
        let (kind, loaded) = &content.statements[0];
        assert_eq!(*kind, StatementKind::BalanceSheet);
        assert!(loaded.row(TICKER_ROW_LABEL).is_none());
        assert_eq!(loaded.cell("Nợ ngắn hạn", 2020), Some("0.000"));
        let ratios = content.ratios.as_ref().unwrap();
        assert_eq!(ratios.cell("P/E", 2024), Some("9.500"));
        assert_eq!(content.tables().len(), 2);
    }

    #[test]
    fn test_valuation_line_defaults_to_zero() {
        let content = ReportContent::new(header());
        assert_eq!(content.valuation_line(), "Giá cổ phiếu định giá: 0.000 (VND)");
    }
}
