pub mod financials_service;
pub mod name_resolver;

pub use financials_service::*;
pub use name_resolver::*;
