pub mod company;
pub mod price;
pub mod ratios;
pub mod statement;

pub use company::*;
pub use price::*;
pub use ratios::*;
pub use statement::*;
