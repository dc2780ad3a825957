use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

/// Upper bound for every euro amount and count a calculator accepts.
pub const MAX_AMOUNT: Decimal = dec!(1000000000);

/// Invalid input handed to a calculator.
///
/// Statutory floors are clamped rather than reported: a gross salary of zero
/// or less simply yields zero tax and contributions. Everything else that
/// would make the arithmetic meaningless is rejected with one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalculationError {
    #[error("gross monthly salary must be non-negative, got {0}")]
    NegativeGrossSalary(Decimal),

    #[error("monthly tax-free allowance must be non-negative, got {0}")]
    NegativeTaxFreeAllowance(Decimal),

    #[error("number of child allowances must be non-negative, got {0}")]
    NegativeChildAllowances(Decimal),

    #[error("{name} must be between 0 and 100 percent, got {value}")]
    InvalidRate { name: &'static str, value: Decimal },

    #[error("list price must be positive, got {0}")]
    NonPositiveListPrice(Decimal),

    #[error("fixed co-payment must be non-negative, got {0}")]
    NegativeFixedCoPayment(Decimal),

    #[error("co-payment percentage must be between 0 and 100, got {0}")]
    InvalidCoPaymentPercentage(Decimal),

    #[error("co-payment threshold must be non-negative, got {0}")]
    NegativeCoPaymentThreshold(Decimal),

    #[error("{name} must not exceed {max}, got {value}", max = MAX_AMOUNT)]
    AmountTooLarge { name: &'static str, value: Decimal },

    #[error("tax year {0} is not modeled")]
    UnsupportedTaxYear(i32),
}

impl CalculationError {
    /// Rejects `value` above [`MAX_AMOUNT`].
    pub(crate) fn check_amount(name: &'static str, value: Decimal) -> Result<(), Self> {
        if value > MAX_AMOUNT {
            return Err(Self::AmountTooLarge { name, value });
        }
        Ok(())
    }
}
