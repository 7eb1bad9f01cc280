//! Technical indicators over a date-ordered close series.
//!
//! Rolling windows produce `None` during warm-up; the public builders then fill
//! those gaps by linear interpolation, taking the nearest defined value at the
//! edges, so every returned series is fully defined when any value is.

use chrono::{Duration, NaiveDate};
use ta::{indicators::ExponentialMovingAverage, Next};

use crate::models::{PricePoint, Series};
use crate::utils::months_before;

pub const SMA_SHORT: usize = 20;
pub const SMA_LONG: usize = 50;
pub const BOLLINGER_WINDOW: usize = 20;
pub const BOLLINGER_WIDTH: f64 = 2.0;
pub const RSI_WINDOW: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Mean of each trailing window of `window` values
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut result = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        result.push(if i + 1 >= window { Some(sum / window as f64) } else { None });
    }
    result
}

/// Sample standard deviation (n - 1) of each trailing window
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
            Some(variance.sqrt())
        })
        .collect()
}

/// Linear interpolation across gaps; leading and trailing gaps take the nearest value
pub fn fill_missing(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, value)| value.map(|v| (i, v)))
        .collect();
    let (Some(&(first_idx, first)), Some(&(last_idx, last))) = (known.first(), known.last()) else {
        return values.to_vec();
    };

    let mut filled = values.to_vec();
    for slot in filled.iter_mut().take(first_idx) {
        *slot = Some(first);
    }
    for slot in filled.iter_mut().skip(last_idx + 1) {
        *slot = Some(last);
    }
    for pair in known.windows(2) {
        let (left_idx, left) = pair[0];
        let (right_idx, right) = pair[1];
        let span = (right_idx - left_idx) as f64;
        for i in left_idx + 1..right_idx {
            let t = (i - left_idx) as f64 / span;
            filled[i] = Some(left + (right - left) * t);
        }
    }
    filled
}

pub fn sma(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    fill_missing(&rolling_mean(closes, window))
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn bollinger_bands(closes: &[f64], window: usize, width: f64) -> BollingerBands {
    let middle = rolling_mean(closes, window);
    let deviation = rolling_std(closes, window);
    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&deviation)
            .map(|(m, d)| match (m, d) {
                (Some(m), Some(d)) => Some(m + sign * width * d),
                _ => None,
            })
            .collect()
    };
    let upper = fill_missing(&band(1.0));
    let lower = fill_missing(&band(-1.0));
    BollingerBands {
        middle: fill_missing(&middle),
        upper,
        lower,
    }
}

/// RSI from simple rolling means of gains and losses
pub fn rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    if closes.is_empty() {
        return Vec::new();
    }
    let mut gains = vec![0.0; closes.len()];
    let mut losses = vec![0.0; closes.len()];
    for i in 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }
    let avg_gain = rolling_mean(&gains, window);
    let avg_loss = rolling_mean(&losses, window);

    let raw: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(gain, loss)| {
            match (gain, loss) {
                (Some(gain), Some(loss)) if *loss > 0.0 => Some(100.0 - 100.0 / (1.0 + gain / loss)),
                (Some(gain), Some(_)) if *gain > 0.0 => Some(100.0),
                _ => None,
            }
        })
        .collect();
    fill_missing(&raw)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Non-adjusted EMA seeded with the first value
pub fn ema(values: &[f64], period: usize) -> anyhow::Result<Vec<f64>> {
    let mut indicator = ExponentialMovingAverage::new(period)
        .map_err(|e| anyhow::anyhow!("invalid EMA period {}: {}", period, e))?;
    Ok(values.iter().map(|value| indicator.next(*value)).collect())
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> anyhow::Result<Macd> {
    let fast_line = ema(closes, fast)?;
    let slow_line = ema(closes, slow)?;
    let macd: Vec<f64> = fast_line.iter().zip(&slow_line).map(|(f, s)| f - s).collect();
    let signal = ema(&macd, signal)?;
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
    Ok(Macd { macd, signal, histogram })
}

/// All chart indicators for one ticker
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub sma_short: Series,
    pub sma_long: Series,
    pub bollinger: BollingerBands,
    pub rsi: Series,
    pub macd: Macd,
}

impl IndicatorSet {
    /// Compute every indicator over `points`, which must be sorted by date
    pub fn compute(points: &[PricePoint]) -> anyhow::Result<Self> {
        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        let close: Vec<f64> = points.iter().map(|p| p.close).collect();
        Ok(Self {
            sma_short: Series::new("SMA20", sma(&close, SMA_SHORT)),
            sma_long: Series::new("SMA50", sma(&close, SMA_LONG)),
            bollinger: bollinger_bands(&close, BOLLINGER_WINDOW, BOLLINGER_WIDTH),
            rsi: Series::new("RSI", rsi(&close, RSI_WINDOW)),
            macd: macd(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL)?,
            dates,
            close,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The sessions within `[start, end]`; values keep the warm-up of the full range
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let from = self.dates.partition_point(|d| *d < start);
        let to = self.dates.partition_point(|d| *d <= end).max(from);
        let slice_opt = |values: &[Option<f64>]| values.get(from..to).unwrap_or_default().to_vec();
        let slice = |values: &[f64]| values.get(from..to).unwrap_or_default().to_vec();
        let series = |s: &Series| Series::new(&s.name, slice_opt(&s.values));

        Self {
            dates: self.dates[from..to].to_vec(),
            close: slice(&self.close),
            sma_short: series(&self.sma_short),
            sma_long: series(&self.sma_long),
            bollinger: BollingerBands {
                middle: slice_opt(&self.bollinger.middle),
                upper: slice_opt(&self.bollinger.upper),
                lower: slice_opt(&self.bollinger.lower),
            },
            rsi: series(&self.rsi),
            macd: Macd {
                macd: slice(&self.macd.macd),
                signal: slice(&self.macd.signal),
                histogram: slice(&self.macd.histogram),
            },
        }
    }
}

/// Reference-day volume against trailing averages
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeComparison {
    pub reference_date: NaiveDate,
    pub day: f64,
    pub week_avg: f64,
    pub month_avg: f64,
    pub three_month_avg: f64,
}

/// Compare volume on `reference` with its 1-week, 1-month and 3-month averages.
/// When `reference` is not a trading day the latest earlier day is used.
pub fn volume_comparison(points: &[PricePoint], reference: NaiveDate) -> Option<VolumeComparison> {
    let eligible: Vec<&PricePoint> = points.iter().filter(|p| p.date <= reference).collect();
    let reference_date = eligible.iter().map(|p| p.date).max()?;
    let day = eligible.iter().find(|p| p.date == reference_date)?.volume as f64;

    let average_since = |start: NaiveDate| -> f64 {
        let window: Vec<f64> = eligible
            .iter()
            .filter(|p| p.date >= start && p.date <= reference_date)
            .map(|p| p.volume as f64)
            .collect();
        if window.is_empty() {
            0.0
        } else {
            window.iter().sum::<f64>() / window.len() as f64
        }
    };

    Some(VolumeComparison {
        reference_date,
        day,
        week_avg: average_since(reference_date - Duration::days(6)),
        month_avg: average_since(months_before(reference_date, 1)),
        three_month_avg: average_since(months_before(reference_date, 3)),
    })
}

/// Closes divided by the first close, gaps interpolated first
pub fn normalize_closes(points: &[PricePoint]) -> Vec<(NaiveDate, f64)> {
    let raw: Vec<Option<f64>> = points
        .iter()
        .map(|p| Some(p.close).filter(|c| c.is_finite() && *c > 0.0))
        .collect();
    let filled = fill_missing(&raw);
    let Some(base) = filled.first().copied().flatten() else {
        return Vec::new();
    };
    points
        .iter()
        .zip(filled)
        .filter_map(|(p, value)| value.map(|v| (p.date, v / base)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rolling_mean_warm_up() {
        let means = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(means, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_rolling_std_is_sample_deviation() {
        let std = rolling_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        // population std is 2.0, sample std is sqrt(32/7)
        assert!(approx(std[7].unwrap(), (32.0f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_fill_missing_both_directions() {
        let filled = fill_missing(&[None, Some(1.0), None, None, Some(4.0), None]);
        assert_eq!(
            filled,
            vec![Some(1.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(4.0)]
        );
        assert_eq!(fill_missing(&[None, None]), vec![None, None]);
    }

    #[test]
    fn test_sma_fills_warm_up_with_first_value() {
        let closes: Vec<f64> = (1..=25).map(f64::from).collect();
        let values = sma(&closes, 20);
        assert_eq!(values[0], Some(10.5));
        assert_eq!(values[24], Some(15.5));
    }

    #[test]
    fn test_rsi_bounds() {
        let rising: Vec<f64> = (1..=30).map(f64::from).collect();
        assert!(rsi(&rising, 14).iter().all(|v| *v == Some(100.0)));

        let zigzag: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 10.0 } else { 11.0 }).collect();
        let values = rsi(&zigzag, 14);
        assert!(values.iter().all(|v| v.map_or(false, |x| (0.0..=100.0).contains(&x))));
        assert!(approx(values[29].unwrap(), 50.0));
    }

    #[test]
    fn test_macd_constant_series_is_flat() {
        let closes = vec![10.0; 40];
        let result = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL).unwrap();
        assert!(result.macd.iter().all(|v| approx(*v, 0.0)));
        assert!(result.histogram.iter().all(|v| approx(*v, 0.0)));
    }

    #[test]
    fn test_ema_matches_recursive_definition() {
        let values = ema(&[1.0, 2.0, 3.0], 3).unwrap();
        // k = 0.5
        assert!(approx(values[0], 1.0));
        assert!(approx(values[1], 1.5));
        assert!(approx(values[2], 2.25));
    }

    #[test]
    fn test_volume_comparison_falls_back_to_last_trading_day() {
        let points: Vec<PricePoint> = (3..=7)
            .map(|d| PricePoint {
                volume: u64::from(d) * 100,
                ..PricePoint::close_only("GEX", day(d), 10.0)
            })
            .collect();
        let cmp = volume_comparison(&points, day(9)).unwrap();
        assert_eq!(cmp.reference_date, day(7));
        assert_eq!(cmp.day, 700.0);
        assert_eq!(cmp.week_avg, 500.0);
        assert!(volume_comparison(&points, day(1)).is_none());
    }

    #[test]
    fn test_within_keeps_values_from_full_history() {
        let points: Vec<PricePoint> = (1..=20)
            .map(|d| PricePoint::close_only("GEX", day(d), 10.0 + d as f64))
            .collect();
        let full = IndicatorSet::compute(&points).unwrap();
        let window = full.within(day(5), day(8));

        assert_eq!(window.dates, vec![day(5), day(6), day(7), day(8)]);
        assert_eq!(window.close, full.close[4..8].to_vec());
        assert_eq!(window.rsi.values, full.rsi.values[4..8].to_vec());
        assert_eq!(window.macd.signal, full.macd.signal[4..8].to_vec());
        assert!(full.within(day(25), day(28)).is_empty());
    }

    #[test]
    fn test_normalize_closes_starts_at_one() {
        let points = vec![
            PricePoint::close_only("GEX", day(3), 20.0),
            PricePoint::close_only("GEX", day(4), 25.0),
        ];
        assert_eq!(normalize_closes(&points), vec![(day(3), 1.0), (day(4), 1.25)]);
    }
}
