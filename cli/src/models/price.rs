use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of a ticker or index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PricePoint {
    /// A point carrying only a closing price, as found in the close-price sheet
    pub fn close_only(ticker: &str, date: NaiveDate, close: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }

    /// Keep points whose date falls within `[start, end]`, sorted by date
    pub fn filter_by_dates(mut data: Vec<PricePoint>, start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
        data.retain(|point| point.date >= start && point.date <= end);
        data.sort_by_key(|point| point.date);
        data
    }
}

/// A date-aligned series of values, `None` where undefined
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Series {
    pub fn new(name: &str, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }

    pub fn last(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|value| *value)
    }
}
