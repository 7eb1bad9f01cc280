use super::utils::{calculate_daily_change, format_percentage_with_sign, format_volume};
use crate::models::{IndustryClassification, PricePoint, RatioTable};

/// Last `max_days` sessions as one line each, oldest first
pub fn format_price_context(ticker: &str, data: &[PricePoint], max_days: usize) -> String {
    if max_days == 0 {
        return String::new();
    }
    if data.is_empty() {
        return format!("{}: No price data available", ticker);
    }

    let mut sorted: Vec<&PricePoint> = data.iter().collect();
    sorted.sort_by_key(|point| point.date);
    let recent: Vec<&PricePoint> = sorted.iter().rev().take(max_days).rev().copied().collect();

    let lines: Vec<String> = recent
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let change = if index > 0 {
                let (_, percent) = calculate_daily_change(point, recent[index - 1]);
                format!(", Change={}", format_percentage_with_sign(percent))
            } else {
                String::new()
            };
            format!(
                "{}: Date={}, Close={:.2}, Volume={}{}",
                ticker,
                point.date.format("%Y-%m-%d"),
                point.close,
                format_volume(point.volume as f64),
                change
            )
        })
        .collect();

    format!("# Last {} Trading Days\n{}", recent.len(), lines.join("\n"))
}

pub fn format_company_context(classification: &IndustryClassification) -> String {
    format!(
        "Company: {}\nExchange: {}\nIndustry: {} / {}",
        classification.company_name, classification.exchange, classification.icb_level1, classification.icb_level2
    )
}

/// One line per year with every published ratio
pub fn format_ratio_context(table: &RatioTable) -> Option<String> {
    if table.is_empty() {
        return None;
    }
    let lines: Vec<String> = table
        .rows
        .iter()
        .filter(|(key, _)| key.parse::<u16>().is_ok())
        .map(|(year, cells)| {
            let values: Vec<String> = table
                .labels
                .iter()
                .zip(cells)
                .filter_map(|(label, cell)| cell.as_ref().map(|v| format!("{}={}", label, v)))
                .collect();
            format!("{}: {}", year, values.join(", "))
        })
        .collect();
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatioRecord;
    use crate::utils::build_ratio_table;
    use chrono::NaiveDate;

    #[test]
    fn test_price_context_takes_latest_days() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let data: Vec<PricePoint> = (0..5)
            .map(|i| PricePoint::close_only("GEX", start + chrono::Duration::days(i), 20.0 + i as f64))
            .collect();
        let context = format_price_context("GEX", &data, 2);
        assert!(context.starts_with("# Last 2 Trading Days"));
        assert!(context.contains("Date=2025-03-04"));
        assert!(context.contains("Date=2025-03-05, Close=24.00, Volume=0, Change=+4.35%"));
        assert!(!context.contains("2025-03-03"));
        assert_eq!(format_price_context("GEX", &data, 0), "");
        assert_eq!(format_price_context("GEX", &[], 3), "GEX: No price data available");
    }

    #[test]
    fn test_ratio_context() {
        let table = build_ratio_table("GEX", &[RatioRecord::new(2024).with("priceToEarning", 12.0)]);
        assert_eq!(format_ratio_context(&table).as_deref(), Some("2024: P/E=12.000"));
        assert!(format_ratio_context(&build_ratio_table("GEX", &[])).is_none());
    }
}
