pub mod context_builders;
pub mod formatters;
pub mod handler;
pub mod templates;
pub mod types;
pub mod utils;

pub use context_builders::*;
pub use formatters::*;
pub use handler::*;
pub use types::*;
pub use utils::*;
