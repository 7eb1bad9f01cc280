//! # finreport - Vietnamese equity report toolkit
//!
//! Building blocks for automated stock reports on Vietnamese listed companies:
//! - Reshaping wide multi-year financial statements into tidy year tables
//! - Technical indicators (SMA, Bollinger, RSI, MACD) and volume comparisons
//! - Financial ratio tables and P/E + P/B blended valuation
//! - Chart models with SVG export and a printpdf report writer
//! - Prompt templates for generated narrative sections
//!
//! ## Quick Start
//!
//! ```rust
//! use finreport::prelude::*;
//!
//! let record = WideRecord::new()
//!     .with("Mã", "GEX")
//!     .with("Nợ ngắn hạn", "500")
//!     .with("Nợ ngắn hạn_3", "1500000000");
//! let table = reshape(&record, StatementKind::BalanceSheet.line_items());
//! assert_eq!(table.cell("Nợ ngắn hạn", 2022), Some("1.500"));
//! ```

pub mod ask_ai;
pub mod charts;
pub mod models;
pub mod report;
pub mod services;
pub mod utils;

pub mod prelude {
    //! Commonly used types and functions
    //!
    //! ```rust
    //! use finreport::prelude::*;
    //! ```

    pub use crate::charts::{export_charts, Chart, RenderConfig};
    pub use crate::models::{
        CompanySnapshot, IndustryClassification, PricePoint, RatioRecord, RatioTable, StatementKind,
        TidyTable, WideRecord,
    };
    pub use crate::report::{write_report, ReportContent, ReportHeader};
    pub use crate::services::{ArtifactStore, MarketDataProvider, SheetService, TextGenerator};
    pub use crate::utils::indicators::IndicatorSet;
    pub use crate::utils::{build_ratio_table, reshape, Valuation};
}

pub use utils::{init_logger, Logger, Timer};
