use serde::{Deserialize, Serialize};

use crate::models::{IndustryMultiples, RatioTable, BVPS_LABEL, EPS_LABEL};
use crate::utils::{parse_number, Logger};

/// Fiscal year whose EPS and BVPS drive the valuation
pub const VALUATION_YEAR: u16 = 2024;

/// Mean of the P/E and P/B implied prices, in thousands of VND
pub fn blended_price(eps: f64, bvps: f64, industry_pe: f64, industry_pb: f64) -> f64 {
    let price_pe = eps * industry_pe;
    let price_pb = bvps * industry_pb;
    (price_pe + price_pb) / 2.0 / 1000.0
}

/// EPS and BVPS for `year` from a formatted ratio table
pub fn eps_bvps(table: &RatioTable, year: u16) -> Option<(f64, f64)> {
    let row = year.to_string();
    let eps = table.cell(&row, EPS_LABEL).and_then(parse_number)?;
    let bvps = table.cell(&row, BVPS_LABEL).and_then(parse_number)?;
    Some((eps, bvps))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub eps: f64,
    pub bvps: f64,
    pub industry_pe: f64,
    pub industry_pb: f64,
    pub price: f64,
}

impl Valuation {
    /// `None` with a logged notice when any input is unavailable
    pub fn compute(table: &RatioTable, multiples: Option<IndustryMultiples>) -> Option<Self> {
        let logger = Logger::new("VALUATION");
        let Some((eps, bvps)) = eps_bvps(table, VALUATION_YEAR) else {
            logger.warn(&format!(
                "⚠️ EPS/BVPS for {} not found in ratio table of {}",
                VALUATION_YEAR, table.ticker
            ));
            return None;
        };
        let Some(multiples) = multiples else {
            logger.warn(&format!("⚠️ Industry P/E and P/B unavailable for {}", table.ticker));
            return None;
        };
        let price = blended_price(eps, bvps, multiples.pe, multiples.pb);
        logger.info(&format!(
            "💰 Valuation for {}: {:.3} (EPS {}, BVPS {}, P/E {}, P/B {})",
            table.ticker, price, eps, bvps, multiples.pe, multiples.pb
        ));
        Some(Self {
            eps,
            bvps,
            industry_pe: multiples.pe,
            industry_pb: multiples.pb,
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatioRecord;
    use crate::utils::build_ratio_table;

    #[test]
    fn test_blended_price() {
        // (2000 * 10 + 20000 * 1.5) / 2 / 1000
        assert!((blended_price(2000.0, 20000.0, 10.0, 1.5) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_compute_reads_formatted_cells() {
        let table = build_ratio_table(
            "GEX",
            &[RatioRecord::new(2024)
                .with("earningPerShare", 2000.0)
                .with("bookValuePerShare", 20000.0)],
        );
        assert_eq!(eps_bvps(&table, 2024), Some((2000.0, 20000.0)));

        let valuation = Valuation::compute(&table, Some(IndustryMultiples { pe: 10.0, pb: 1.5 })).unwrap();
        assert!((valuation.price - 25.0).abs() < 1e-12);
        assert!(Valuation::compute(&table, None).is_none());
    }

    #[test]
    fn test_missing_year_gives_none() {
        let table = build_ratio_table("GEX", &[RatioRecord::new(2023).with("earningPerShare", 1.0)]);
        assert!(Valuation::compute(&table, Some(IndustryMultiples { pe: 1.0, pb: 1.0 })).is_none());
    }
}
