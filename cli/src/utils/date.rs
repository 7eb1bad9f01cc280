use chrono::{DateTime, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::{Asia::Ho_Chi_Minh, Tz};

/// Current time in Vietnam
pub fn vietnam_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Ho_Chi_Minh)
}

/// Convert a UTC instant to Vietnam local time
pub fn to_vietnam(time: DateTime<Utc>) -> DateTime<Tz> {
    time.with_timezone(&Ho_Chi_Minh)
}

/// Date stamp used in artifact file names (`ddmmyyyy`)
pub fn artifact_date_stamp<T: TimeZone>(time: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    time.format("%d%m%Y").to_string()
}

/// Timestamp used in report file names (`yyyymmdd_HHMM`)
pub fn report_stamp<T: TimeZone>(time: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    time.format("%Y%m%d_%H%M").to_string()
}

/// Parse ISO date string (YYYY-MM-DD)
pub fn parse_iso_date(date_str: &str) -> anyhow::Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")?)
}

/// Parse sheet date string (DD/MM/YYYY)
pub fn parse_sheet_date(date_str: &str) -> anyhow::Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str.trim(), "%d/%m/%Y")?)
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Date embedded as the last `_`-separated segment of an artifact file name,
/// e.g. `GEX_bs_01042025.csv`
pub fn date_from_artifact_name(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    let (_, stamp) = stem.rsplit_once('_')?;
    NaiveDate::parse_from_str(stamp, "%d%m%Y").ok()
}

/// Calendar-month offset, clamped to month end (Mar 31 - 1 month = Feb 28/29)
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_stamps() {
        let time = Utc.with_ymd_and_hms(2025, 4, 1, 20, 5, 0).unwrap();
        let local = to_vietnam(time);
        // 20:05 UTC is already the next day in Vietnam
        assert_eq!(artifact_date_stamp(&local), "02042025");
        assert_eq!(report_stamp(&local), "20250402_0305");
    }

    #[test]
    fn test_date_from_artifact_name() {
        assert_eq!(
            date_from_artifact_name("GEX_financialratios_01042025.csv"),
            NaiveDate::from_ymd_opt(2025, 4, 1)
        );
        assert_eq!(
            date_from_artifact_name("GEX_draw_chart_1_15032025.svg"),
            NaiveDate::from_ymd_opt(2025, 3, 15)
        );
        assert_eq!(date_from_artifact_name("GEX_bs.csv"), None);
    }

    #[test]
    fn test_date_parsing() {
        assert_eq!(
            parse_sheet_date("03/01/2023").unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 3).unwrap()
        );
        assert!(parse_iso_date("2025-13-01").is_err());
        let end = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(months_before(end, 1), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }
}
