//! Benefit in kind (geldwerter Vorteil) and employee co-payment for a
//! company car under the list-price method.

use rust_decimal::Decimal;

use crate::calculations::CalculationError;
use crate::calculations::common::round_half_up;
use crate::{CoPaymentPolicy, TaxParameters, Vehicle};

#[derive(Debug, Clone, Copy)]
pub struct CompanyCarCalculator<'a> {
    params: &'a TaxParameters,
}

impl<'a> CompanyCarCalculator<'a> {
    pub fn new(params: &'a TaxParameters) -> Self {
        Self { params }
    }

    /// Monthly taxable benefit: list price × rate for the taxation type.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the vehicle fails validation.
    pub fn benefit(
        &self,
        vehicle: &Vehicle,
    ) -> Result<Decimal, CalculationError> {
        vehicle.validate()?;
        Ok(round_half_up(
            vehicle.list_price * self.params.benefit_rate(vehicle.taxation),
        ))
    }

    /// Monthly co-payment under the vehicle's policy, or the default policy
    /// when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the vehicle fails validation.
    pub fn co_payment(
        &self,
        vehicle: &Vehicle,
    ) -> Result<Decimal, CalculationError> {
        vehicle.validate()?;
        let amount = match vehicle.effective_co_payment() {
            CoPaymentPolicy::None => Decimal::ZERO,
            CoPaymentPolicy::Fixed { monthly_amount } => monthly_amount,
            CoPaymentPolicy::Percentage {
                percentage,
                threshold,
            } => {
                let above = (vehicle.list_price - threshold).max(Decimal::ZERO);
                round_half_up(above * percentage / Decimal::ONE_HUNDRED)
            }
        };
        Ok(amount)
    }
}
