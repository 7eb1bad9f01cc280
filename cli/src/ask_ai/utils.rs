use crate::models::PricePoint;

/// Absolute and percent change between consecutive closes
pub fn calculate_daily_change(current: &PricePoint, previous: &PricePoint) -> (f64, f64) {
    let change = current.close - previous.close;
    let change_percent = if previous.close != 0.0 {
        (change / previous.close) * 100.0
    } else {
        0.0
    };
    (change, change_percent)
}

/// Format volume with appropriate suffix
pub fn format_volume(volume: f64) -> String {
    if volume >= 1_000_000.0 {
        format!("{:.1}M", volume / 1_000_000.0)
    } else if volume >= 1_000.0 {
        format!("{:.0}k", volume / 1_000.0)
    } else {
        format!("{:.0}", volume)
    }
}

/// Format percentage with sign
pub fn format_percentage_with_sign(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}

/// Replace the `{ticker}` placeholder
pub fn render_ticker(prompt: &str, ticker: &str) -> String {
    prompt.replace("{ticker}", &ticker.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_daily_change() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let previous = PricePoint::close_only("GEX", date, 20.0);
        let current = PricePoint::close_only("GEX", date, 21.0);
        let (change, percent) = calculate_daily_change(&current, &previous);
        assert!((change - 1.0).abs() < 1e-12);
        assert!((percent - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_volume(2_500_000.0), "2.5M");
        assert_eq!(format_volume(12_300.0), "12k");
        assert_eq!(format_percentage_with_sign(1.5), "+1.50%");
        assert_eq!(format_percentage_with_sign(-0.25), "-0.25%");
        assert_eq!(render_ticker("Giới thiệu {ticker}", "gex"), "Giới thiệu GEX");
    }
}
