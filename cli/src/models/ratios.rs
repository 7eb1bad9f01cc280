use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::statement::{TidyRow, TidyTable, FISCAL_YEARS};

/// Label of the classification row appended below the yearly rows
pub const CLASSIFICATION_ROW_LABEL: &str = "Phân loại";

pub const GROUP_CAPITAL_STRUCTURE: &str = "Chỉ tiêu cơ cấu nguồn vốn";
pub const GROUP_EFFICIENCY: &str = "Chỉ tiêu hiệu quả hoạt động";
pub const GROUP_PROFITABILITY: &str = "Chỉ tiêu khả năng sinh lợi";
pub const GROUP_LIQUIDITY: &str = "Chỉ tiêu thanh khoản";
pub const GROUP_VALUATION: &str = "Chỉ tiêu định giá";

pub const EPS_LABEL: &str = "EPS (VND)";
pub const BVPS_LABEL: &str = "BVPS (VND)";

/// A ratio shown in the report and where the vendor publishes it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioDefinition {
    pub label: &'static str,
    pub group: &'static str,
    /// Vendor field name, `None` when the vendor has no equivalent
    pub source_key: Option<&'static str>,
    /// Multiplier applied to the vendor value
    pub scale: f64,
}

const fn ratio(label: &'static str, group: &'static str, source_key: Option<&'static str>, scale: f64) -> RatioDefinition {
    RatioDefinition { label, group, source_key, scale }
}

/// Report ratios in column order
pub const RATIO_DEFINITIONS: &[RatioDefinition] = &[
    ratio("(Vay NH+DH)/VCSH", GROUP_CAPITAL_STRUCTURE, Some("debtOnEquity"), 1.0),
    ratio("Nợ/VCSH", GROUP_CAPITAL_STRUCTURE, Some("payableOnEquity"), 1.0),
    ratio("TSCĐ / Vốn CSH", GROUP_CAPITAL_STRUCTURE, Some("fixedAssetOnEquity"), 1.0),
    ratio("Vốn CSH/Vốn điều lệ", GROUP_CAPITAL_STRUCTURE, Some("equityOnCharterCapital"), 1.0),
    ratio("Số ngày thu tiền bình quân", GROUP_EFFICIENCY, Some("daysReceivable"), 1.0),
    ratio("Số ngày tồn kho bình quân", GROUP_EFFICIENCY, Some("daysInventory"), 1.0),
    ratio("Số ngày thanh toán bình quân", GROUP_EFFICIENCY, Some("daysPayable"), 1.0),
    ratio("Biên lợi nhuận gộp (%)", GROUP_PROFITABILITY, Some("grossProfitMargin"), 100.0),
    ratio("Biên lợi nhuận ròng (%)", GROUP_PROFITABILITY, Some("postTaxMargin"), 100.0),
    ratio("ROE (%)", GROUP_PROFITABILITY, Some("roe"), 100.0),
    ratio("ROA (%)", GROUP_PROFITABILITY, Some("roa"), 100.0),
    ratio("Chỉ số thanh toán hiện thời", GROUP_LIQUIDITY, Some("currentPayment"), 1.0),
    ratio("Chỉ số thanh toán nhanh", GROUP_LIQUIDITY, Some("quickPayment"), 1.0),
    ratio("Khả năng chi trả lãi vay", GROUP_LIQUIDITY, Some("ebitOnInterest"), 1.0),
    ratio("Đòn bẩy tài chính", GROUP_LIQUIDITY, Some("assetOnEquity"), 1.0),
    ratio("P/E", GROUP_VALUATION, Some("priceToEarning"), 1.0),
    ratio("P/B", GROUP_VALUATION, Some("priceToBook"), 1.0),
    ratio(EPS_LABEL, GROUP_VALUATION, Some("earningPerShare"), 1.0),
    ratio(BVPS_LABEL, GROUP_VALUATION, Some("bookValuePerShare"), 1.0),
];

pub fn ratio_definition(label: &str) -> Option<&'static RatioDefinition> {
    RATIO_DEFINITIONS.iter().find(|def| def.label == label)
}

/// One fiscal year of vendor ratios, keyed by vendor field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioRecord {
    pub year: u16,
    pub values: HashMap<String, f64>,
}

impl RatioRecord {
    pub fn new(year: u16) -> Self {
        Self { year, values: HashMap::new() }
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }
}

/// Years as rows, ratios as columns, plus a classification row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioTable {
    pub ticker: String,
    pub labels: Vec<String>,
    pub classifications: Vec<String>,
    /// `(row key, formatted cells aligned with labels)`
    pub rows: Vec<(String, Vec<Option<String>>)>,
}

impl RatioTable {
    pub fn cell(&self, row_key: &str, label: &str) -> Option<&str> {
        let column = self.labels.iter().position(|l| l == label)?;
        self.rows
            .iter()
            .find(|(key, _)| key == row_key)
            .and_then(|(_, cells)| cells.get(column))
            .and_then(|cell| cell.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.rows.is_empty()
    }

    /// Ratios as rows and fiscal years as columns, classification row dropped
    pub fn transposed(&self) -> TidyTable {
        let mut table = TidyTable::new(self.ticker.clone());
        for (column, label) in self.labels.iter().enumerate() {
            let cells = FISCAL_YEARS
                .iter()
                .map(|year| {
                    self.rows
                        .iter()
                        .find(|(key, _)| *key == year.to_string())
                        .and_then(|(_, cells)| cells.get(column).cloned().flatten())
                })
                .collect();
            table.rows.push(TidyRow {
                label: label.clone(),
                cells,
            });
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_cover_report_groups() {
        assert_eq!(RATIO_DEFINITIONS.len(), 19);
        assert_eq!(ratio_definition("ROE (%)").map(|d| d.scale), Some(100.0));
        assert_eq!(ratio_definition("P/B").map(|d| d.group), Some(GROUP_VALUATION));
        assert!(ratio_definition("unknown").is_none());
    }

    #[test]
    fn test_transposed_view_drops_classification() {
        let table = RatioTable {
            ticker: "GEX".into(),
            labels: vec!["P/E".into()],
            classifications: vec![GROUP_VALUATION.into()],
            rows: vec![
                ("2023".into(), vec![Some("10.000".into())]),
                ("2024".into(), vec![Some("12.500".into())]),
                (CLASSIFICATION_ROW_LABEL.into(), vec![Some(GROUP_VALUATION.into())]),
            ],
        };
        let view = table.transposed();
        assert_eq!(view.labels(), vec!["P/E"]);
        assert_eq!(view.cell("P/E", 2024), Some("12.500"));
        assert_eq!(view.cell("P/E", 2020), None);
    }
}
