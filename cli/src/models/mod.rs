pub mod company;
pub mod financials;
pub mod valuation;

pub use company::*;
pub use financials::*;
pub use valuation::*;
