pub mod artifact_store;
pub mod providers;
pub mod sheet_service;

pub use artifact_store::*;
pub use providers::*;
pub use sheet_service::*;
