mod federal_state;
mod tax_class;
mod tax_parameters;
mod user_data;
mod vehicle;

use thiserror::Error;

pub use federal_state::FederalState;
pub use tax_class::TaxClass;
pub use tax_parameters::TaxParameters;
pub use user_data::{DEFAULT_PROFILE_NAME, ProfileUpdate, UserData, UserProfile};
pub use vehicle::{CoPaymentPolicy, TaxationType, Vehicle};

/// Errors raised when parsing enumerated profile or vehicle fields from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown tax class '{0}' (expected 1-6 or I-VI)")]
    TaxClass(String),

    #[error("unknown federal state '{0}'")]
    FederalState(String),

    #[error("unknown taxation type '{0}' (expected full, hybrid or electric)")]
    TaxationType(String),
}
