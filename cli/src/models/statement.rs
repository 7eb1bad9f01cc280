use serde::{Deserialize, Serialize};
use std::fmt;

/// Column holding the ticker in every statement sheet
pub const TICKER_COLUMN: &str = "Mã";

/// Label of the synthetic first row of a tidy statement
pub const TICKER_ROW_LABEL: &str = "Mã cổ phiếu";

/// Fiscal years covered by a tidy statement, in column order
pub const FISCAL_YEARS: [u16; 5] = [2020, 2021, 2022, 2023, 2024];

const BALANCE_SHEET_ITEMS: &[&str] = &[
    "TÀI SẢN NGẮN HẠN",
    "TÀI SẢN DÀI HẠN",
    "TỔNG CỘNG TÀI SẢN",
    "Nợ ngắn hạn",
    "Nợ dài hạn",
    "NỢ PHẢI TRẢ",
    "VỐN CHỦ SỞ HỮU",
    "TỔNG CỘNG NGUỒN VỐN",
];

const INCOME_STATEMENT_ITEMS: &[&str] = &[
    "Doanh thu thuần",
    "Lợi nhuận gộp về bán hàng và cung cấp dịch vụ",
    "Lợi nhuận thuần từ hoạt động kinh doanh",
    "Tổng lợi nhuận kế toán trước thuế",
    "Lợi nhuận sau thuế thu nhập doanh nghiệp",
];

const CASH_FLOW_ITEMS: &[&str] = &[
    "Lưu chuyển tiền tệ ròng từ các hoạt động sản xuất kinh doanh (TT)",
    "Lưu chuyển tiền tệ ròng từ hoạt động đầu tư (TT)",
    "Lưu chuyển tiền tệ từ hoạt động tài chính (TT)",
    "Lưu chuyển tiền thuần trong kỳ (TT)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    #[serde(rename = "bs")]
    BalanceSheet,
    #[serde(rename = "is")]
    IncomeStatement,
    #[serde(rename = "cf")]
    CashFlow,
}

impl StatementKind {
    pub fn all() -> [StatementKind; 3] {
        [Self::BalanceSheet, Self::IncomeStatement, Self::CashFlow]
    }

    /// Short code used in artifact names
    pub fn code(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "bs",
            Self::IncomeStatement => "is",
            Self::CashFlow => "cf",
        }
    }

    /// Sheet-name suffix shared by the workbook and its sheets
    fn sheet_tag(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "CĐKT",
            Self::IncomeStatement => "KQKD",
            Self::CashFlow => "LCTT",
        }
    }

    pub fn workbook_name(&self) -> String {
        format!("data_{}", self.sheet_tag())
    }

    /// The five era sheets of the workbook, oldest first
    pub fn sheet_names(&self) -> Vec<String> {
        (1..=5)
            .map(|i| format!("data{}_{}", i, self.sheet_tag()))
            .collect()
    }

    /// Canonical line items in report order
    pub fn line_items(&self) -> &'static [&'static str] {
        match self {
            Self::BalanceSheet => BALANCE_SHEET_ITEMS,
            Self::IncomeStatement => INCOME_STATEMENT_ITEMS,
            Self::CashFlow => CASH_FLOW_ITEMS,
        }
    }

    pub fn title_vn(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "Bảng cân đối kế toán",
            Self::IncomeStatement => "Báo cáo kết quả kinh doanh",
            Self::CashFlow => "Báo cáo lưu chuyển tiền tệ",
        }
    }

    /// Heading of the statement table in the report
    pub fn table_title(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "Cân đối kế toán",
            Self::IncomeStatement => "Kết quả kinh doanh",
            Self::CashFlow => "Lưu chuyển tiền tệ",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A raw spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Parse a raw sheet cell; blanks become `Empty`, numbers keep full precision
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => CellValue::Number(value),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    /// Numeric view of the cell; thousands-separator commas are tolerated
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => crate::utils::parse_number(text),
            CellValue::Empty => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(value) => value.to_string(),
            CellValue::Text(text) => text.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(raw: &str) -> Self {
        CellValue::Text(raw.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One ticker's statement data spread across suffixed columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideRecord {
    columns: Vec<(String, CellValue)>,
}

impl WideRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column, replacing the value of an existing column with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(existing, _)| existing == name)
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn ticker(&self) -> Option<String> {
        self.get(TICKER_COLUMN)
            .map(|value| value.as_text())
            .filter(|ticker| !ticker.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when nothing but (at most) the ticker column is present
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|(name, _)| name == TICKER_COLUMN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidyRow {
    pub label: String,
    pub cells: Vec<Option<String>>,
}

/// Line items as rows, fiscal years as columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidyTable {
    pub ticker: String,
    pub years: Vec<u16>,
    pub rows: Vec<TidyRow>,
}

impl TidyTable {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            years: FISCAL_YEARS.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(&self, label: &str) -> Option<&TidyRow> {
        self.rows.iter().find(|row| row.label == label)
    }

    pub fn cell(&self, label: &str, year: u16) -> Option<&str> {
        let column = self.years.iter().position(|y| *y == year)?;
        self.row(label)?
            .cells
            .get(column)
            .and_then(|cell| cell.as_deref())
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }

    /// True when every non-ticker cell is null
    pub fn is_blank(&self) -> bool {
        self.rows
            .iter()
            .filter(|row| row.label != TICKER_ROW_LABEL)
            .all(|row| row.cells.iter().all(Option::is_none))
    }

    pub fn header(&self, first_column: &str) -> Vec<String> {
        std::iter::once(first_column.to_string())
            .chain(self.years.iter().map(|year| year.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_names_follow_workbook_tag() {
        let sheets = StatementKind::BalanceSheet.sheet_names();
        assert_eq!(sheets.len(), 5);
        assert_eq!(sheets[0], "data1_CĐKT");
        assert_eq!(sheets[4], "data5_CĐKT");
        assert_eq!(StatementKind::CashFlow.workbook_name(), "data_LCTT");
    }

    #[test]
    fn test_wide_record_insert_replaces_in_place() {
        let mut record = WideRecord::new().with("Mã", "GEX").with("A", 1.0);
        record.insert("A", 2.0);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("A"), Some(&CellValue::Number(2.0)));
        assert_eq!(record.ticker().as_deref(), Some("GEX"));
    }

    #[test]
    fn test_cell_value_parsing() {
        assert_eq!(CellValue::from_raw(" "), CellValue::Empty);
        assert_eq!(CellValue::from_raw("12.5"), CellValue::Number(12.5));
        assert_eq!(CellValue::from_raw("1,500").as_number(), Some(1500.0));
        assert_eq!(CellValue::from_raw("n/a").as_number(), None);
    }
}
