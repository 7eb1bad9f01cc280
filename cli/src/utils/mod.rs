pub mod date;
pub mod indicators;
pub mod logger;
pub mod ratio_table;
pub mod statement_reshape;
pub mod text;
pub mod valuation;

pub use date::*;
pub use logger::*;
pub use ratio_table::*;
pub use statement_reshape::reshape;
pub use text::*;
pub use valuation::*;
