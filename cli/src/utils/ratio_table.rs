use crate::models::{
    RatioRecord, RatioTable, CLASSIFICATION_ROW_LABEL, FISCAL_YEARS, RATIO_DEFINITIONS,
};
use crate::utils::{format_thousands, Logger};

/// `12,345` for values of 1000 and above, three decimals otherwise
pub fn format_ratio(value: f64) -> String {
    if value >= 1000.0 {
        format_thousands(value)
    } else {
        format!("{:.3}", value)
    }
}

/// Arrange vendor ratio records into the report layout.
///
/// Only ratios the vendor actually published are kept, in report order. Rows are
/// the fiscal years found in `records` (oldest first), followed by the
/// classification row.
pub fn build_ratio_table(ticker: &str, records: &[RatioRecord]) -> RatioTable {
    let logger = Logger::new("RATIOS");

    let mut yearly: Vec<&RatioRecord> = records
        .iter()
        .filter(|record| FISCAL_YEARS.contains(&record.year))
        .collect();
    yearly.sort_by_key(|record| record.year);
    yearly.dedup_by_key(|record| record.year);

    let definitions: Vec<_> = RATIO_DEFINITIONS
        .iter()
        .filter(|def| {
            def.source_key
                .is_some_and(|key| yearly.iter().any(|record| record.values.contains_key(key)))
        })
        .collect();

    if yearly.is_empty() || definitions.is_empty() {
        logger.info(&format!("ℹ️ No usable financial ratios for {}", ticker));
    }

    let mut rows: Vec<(String, Vec<Option<String>>)> = yearly
        .iter()
        .map(|record| {
            let cells = definitions
                .iter()
                .map(|def| {
                    def.source_key
                        .and_then(|key| record.values.get(key))
                        .filter(|value| value.is_finite())
                        .map(|value| format_ratio(value * def.scale))
                })
                .collect();
            (record.year.to_string(), cells)
        })
        .collect();

    if !rows.is_empty() {
        rows.push((
            CLASSIFICATION_ROW_LABEL.to_string(),
            definitions.iter().map(|def| Some(def.group.to_string())).collect(),
        ));
    }

    RatioTable {
        ticker: ticker.to_string(),
        labels: definitions.iter().map(|def| def.label.to_string()).collect(),
        classifications: definitions.iter().map(|def| def.group.to_string()).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BVPS_LABEL, EPS_LABEL, GROUP_PROFITABILITY};

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(0.5), "0.500");
        assert_eq!(format_ratio(999.9994), "999.999");
        assert_eq!(format_ratio(2414.4), "2,414");
        assert_eq!(format_ratio(-1500.0), "-1500.000");
    }

    #[test]
    fn test_build_ratio_table_layout() {
        let records = vec![
            RatioRecord::new(2024).with("roe", 0.1234).with("earningPerShare", 2345.0),
            RatioRecord::new(2023).with("roe", 0.1).with("bookValuePerShare", 15000.0),
            RatioRecord::new(2019).with("roe", 0.5),
            RatioRecord::new(2024).with("unmapped", 1.0),
        ];
        let table = build_ratio_table("GEX", &records);

        assert_eq!(table.labels, vec!["ROE (%)", EPS_LABEL, BVPS_LABEL]);
        let keys: Vec<&str> = table.rows.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["2023", "2024", CLASSIFICATION_ROW_LABEL]);
        assert_eq!(table.cell("2024", "ROE (%)"), Some("12.340"));
        assert_eq!(table.cell("2024", EPS_LABEL), Some("2,345"));
        assert_eq!(table.cell("2023", EPS_LABEL), None);
        assert_eq!(table.cell(CLASSIFICATION_ROW_LABEL, "ROE (%)"), Some(GROUP_PROFITABILITY));
    }

    #[test]
    fn test_empty_records_give_empty_table() {
        let table = build_ratio_table("GEX", &[]);
        assert!(table.is_empty());
        assert!(table.rows.is_empty());
    }
}
