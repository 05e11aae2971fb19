pub mod catalog;
pub mod routing;

pub use catalog::{STEPS, STEP_COUNT};
pub use routing::{CompanyHandler, CompanyRouter, SPECIAL_CASE_ALIASES};
