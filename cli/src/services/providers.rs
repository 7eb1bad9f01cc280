use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{CompanySnapshot, PricePoint, RatioRecord};

/// Remote market data used by the report pipeline
#[async_trait]
pub trait MarketDataProvider: Send {
    /// Daily OHLCV bars for `symbol` (a ticker or an exchange index) within `[start, end]`
    async fn price_history(
        &mut self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<PricePoint>>;

    async fn company_snapshot(&mut self, ticker: &str) -> anyhow::Result<CompanySnapshot>;

    /// Yearly ratio records keyed by vendor field name
    async fn financial_ratios(&mut self, ticker: &str) -> anyhow::Result<Vec<RatioRecord>>;
}

/// Text generation backend for the narrative sections
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
