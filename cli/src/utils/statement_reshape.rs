//! Wide statement extracts to tidy per-year tables.
//!
//! A wide record carries one column per (line item, sheet era). Column names are
//! `"<label>"` for the base year or `"<label>_<suffix>"` where the first digit run
//! of the suffix selects the fiscal year:
//!
//! | suffix digits | year |
//! |---------------|------|
//! | none          | 2020 |
//! | 2             | 2021 |
//! | 3             | 2022 |
//! | 4             | 2023 |
//! | 5             | 2024 |
//!
//! Any other digit run drops the column. Values for 2020-2022 are reported in
//! units of 1e9 and values for 2023-2024 in units of 1e3, formatted with three
//! decimals.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{TidyRow, TidyTable, WideRecord, FISCAL_YEARS, TICKER_COLUMN, TICKER_ROW_LABEL};
use crate::utils::Logger;

/// Where a wide column lands in the tidy table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnYear {
    Year(u16),
    /// Suffix digits outside the known eras
    Dropped(u64),
}

fn digit_run() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("static pattern"))
}

/// Split a wide column name into its trimmed base label and the suffix segment
/// between the first and second underscore
pub fn split_column(name: &str) -> (&str, Option<&str>) {
    let mut parts = name.split('_');
    let base = parts.next().unwrap_or_default().trim();
    (base, parts.next())
}

pub fn year_for_suffix(suffix: Option<&str>) -> ColumnYear {
    let Some(suffix) = suffix else {
        return ColumnYear::Year(2020);
    };
    let Some(digits) = digit_run().find(suffix) else {
        return ColumnYear::Year(2020);
    };
    match digits.as_str().parse::<u64>() {
        Ok(2) => ColumnYear::Year(2021),
        Ok(3) => ColumnYear::Year(2022),
        Ok(4) => ColumnYear::Year(2023),
        Ok(5) => ColumnYear::Year(2024),
        Ok(other) => ColumnYear::Dropped(other),
        Err(_) => ColumnYear::Dropped(u64::MAX),
    }
}

/// Divisor that brings a raw value for `year` into report units
pub fn unit_divisor(year: u16) -> f64 {
    if year <= 2022 {
        1_000_000_000.0
    } else {
        1_000.0
    }
}

pub fn format_cell(value: f64) -> String {
    format!("{:.3}", value)
}

/// Reshape one ticker's wide statement record.
///
/// `line_items` fixes the leading row order; labels found in the record but not
/// listed follow in first-seen order. The first row is always the ticker row.
/// Cells that are absent or fail numeric parsing stay `None`.
pub fn reshape(record: &WideRecord, line_items: &[&str]) -> TidyTable {
    let logger = Logger::new("RESHAPE");
    let ticker = record.ticker().unwrap_or_default();

    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, HashMap<u16, Option<f64>>> = HashMap::new();

    for (name, value) in record.columns() {
        if name == TICKER_COLUMN {
            continue;
        }
        let (base, suffix) = split_column(name);
        let year = match year_for_suffix(suffix) {
            ColumnYear::Year(year) => year,
            ColumnYear::Dropped(digits) => {
                logger.warn(&format!(
                    "⚠️ Dropping column '{}' for {}: suffix {} maps to no fiscal year",
                    name, ticker, digits
                ));
                continue;
            }
        };
        if !grouped.contains_key(base) {
            order.push(base.to_string());
        }
        grouped
            .entry(base.to_string())
            .or_default()
            .insert(year, value.as_number());
    }

    let mut labels: Vec<String> = line_items
        .iter()
        .filter(|item| grouped.contains_key(**item))
        .map(|item| item.to_string())
        .collect();
    for label in order {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    let mut table = TidyTable::new(ticker.clone());
    table.rows.push(TidyRow {
        label: TICKER_ROW_LABEL.to_string(),
        cells: FISCAL_YEARS.iter().map(|_| Some(ticker.clone())).collect(),
    });

    for label in labels {
        let by_year = grouped.get(&label);
        let cells = FISCAL_YEARS
            .iter()
            .map(|year| {
                by_year
                    .and_then(|values| values.get(year).copied().flatten())
                    .map(|raw| format_cell(raw / unit_divisor(*year)))
            })
            .collect();
        table.rows.push(TidyRow { label, cells });
    }

    if table.rows.len() == 1 {
        logger.info(&format!("ℹ️ No statement columns for '{}', table is empty", ticker));
    } else {
        logger.debug(&format!("Reshaped {} line items for {}", table.rows.len() - 1, ticker));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatementKind;

    fn gex_record() -> WideRecord {
        WideRecord::new()
            .with("Mã", "GEX")
            .with("Nợ ngắn hạn", "500")
            .with("Nợ ngắn hạn_3", "1500000000")
    }

    #[test]
    fn test_unsuffixed_columns_map_to_2020() {
        assert_eq!(year_for_suffix(None), ColumnYear::Year(2020));
        let table = reshape(&WideRecord::new().with("Mã", "X").with("A", 2e9), &[]);
        assert_eq!(table.cell("A", 2020), Some("2.000"));
    }

    #[test]
    fn test_suffix_digits_select_year() {
        assert_eq!(year_for_suffix(Some("2")), ColumnYear::Year(2021));
        assert_eq!(year_for_suffix(Some("3")), ColumnYear::Year(2022));
        assert_eq!(year_for_suffix(Some("data4")), ColumnYear::Year(2023));
        assert_eq!(year_for_suffix(Some("05")), ColumnYear::Year(2024));
        assert_eq!(year_for_suffix(Some("abc")), ColumnYear::Year(2020));
        assert_eq!(year_for_suffix(Some("1")), ColumnYear::Dropped(1));
        assert_eq!(year_for_suffix(Some("6")), ColumnYear::Dropped(6));
    }

    #[test]
    fn test_sheet_merge_suffix_uses_sheet_number() {
        assert_eq!(split_column("Nợ ngắn hạn_data2_CĐKT"), ("Nợ ngắn hạn", Some("data2")));
        assert_eq!(year_for_suffix(Some("data2")), ColumnYear::Year(2021));
    }

    #[test]
    fn test_unknown_suffix_drops_column() {
        let record = WideRecord::new()
            .with("Mã", "X")
            .with("A_6", 1.0)
            .with("B_1", 1.0)
            .with("A_2", 3e9);
        let table = reshape(&record, &[]);
        assert_eq!(table.labels(), vec![TICKER_ROW_LABEL, "A"]);
        assert_eq!(table.cell("A", 2021), Some("3.000"));
        assert!(table.row("B").is_none());
    }

    #[test]
    fn test_reshape_is_idempotent() {
        let record = gex_record().with("Khác_4", "12,000").with("Nợ dài hạn_5", "x");
        let items = StatementKind::BalanceSheet.line_items();
        let first = reshape(&record, items);
        let second = reshape(&record, items);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_scale_by_era() {
        let record = WideRecord::new()
            .with("Mã", "X")
            .with("A_2", 1_000_000_000.0)
            .with("A_4", 1_000.0)
            .with("A_5", "2,500");
        let table = reshape(&record, &[]);
        assert_eq!(table.cell("A", 2021), Some("1.000"));
        assert_eq!(table.cell("A", 2023), Some("1.000"));
        assert_eq!(table.cell("A", 2024), Some("2.500"));
    }

    #[test]
    fn test_missing_and_unparsable_cells_stay_null() {
        let record = WideRecord::new()
            .with("Mã", "X")
            .with("A", "not a number")
            .with("A_3", 3e9);
        let table = reshape(&record, &[]);
        assert_eq!(table.cell("A", 2020), None);
        assert_eq!(table.cell("A", 2021), None);
        assert_eq!(table.cell("A", 2022), Some("3.000"));
        let row = table.row("A").unwrap();
        assert!(row.cells.iter().all(|cell| cell.as_deref() != Some("0.000")));
    }

    #[test]
    fn test_gex_end_to_end() {
        let table = reshape(&gex_record(), StatementKind::BalanceSheet.line_items());
        assert_eq!(table.ticker, "GEX");
        assert_eq!(table.labels(), vec![TICKER_ROW_LABEL, "Nợ ngắn hạn"]);
        assert_eq!(table.cell("Nợ ngắn hạn", 2020), Some("0.000"));
        assert_eq!(table.cell("Nợ ngắn hạn", 2022), Some("1.500"));
        assert_eq!(table.cell("Nợ ngắn hạn", 2021), None);
        assert_eq!(table.cell(TICKER_ROW_LABEL, 2024), Some("GEX"));
    }

    #[test]
    fn test_canonical_order_then_first_seen() {
        let record = WideRecord::new()
            .with("Mã", "X")
            .with("Zeta", 1.0)
            .with("NỢ PHẢI TRẢ", 1.0)
            .with("Alpha", 1.0)
            .with("TÀI SẢN NGẮN HẠN", 1.0);
        let table = reshape(&record, StatementKind::BalanceSheet.line_items());
        assert_eq!(
            table.labels(),
            vec![TICKER_ROW_LABEL, "TÀI SẢN NGẮN HẠN", "NỢ PHẢI TRẢ", "Zeta", "Alpha"]
        );
    }

    #[test]
    fn test_record_without_columns_yields_blank_table() {
        let table = reshape(&WideRecord::new(), StatementKind::CashFlow.line_items());
        assert_eq!(table.labels(), vec![TICKER_ROW_LABEL]);
        assert!(table.is_blank());
        assert_eq!(table.cell(TICKER_ROW_LABEL, 2020), Some(""));
    }
}
