//! Payroll calculators for the 2025 tax year.
//!
//! Each calculator borrows a [`TaxParameters`](crate::TaxParameters) and is
//! otherwise stateless, so one set of parameters can serve any number of
//! calculations and threads.

pub mod church_tax;
pub mod common;
pub mod company_car;
pub mod comparison;
pub mod error;
pub mod income_tax;
pub mod social_insurance;

pub use church_tax::ChurchTaxCalculator;
pub use company_car::CompanyCarCalculator;
pub use comparison::{ComparisonResult, NetIncomeBreakdown, NetIncomeComparator, VehicleComparison};
pub use error::{CalculationError, MAX_AMOUNT};
pub use income_tax::IncomeTaxCalculator;
pub use social_insurance::{SocialInsuranceCalculator, SocialInsuranceContributions};
