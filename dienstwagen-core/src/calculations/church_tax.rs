//! Church tax (Kirchensteuer) as a share of the monthly wage tax.
//!
//! The rate is 8 % in Bayern and Baden-Württemberg and 9 % elsewhere.
//! Child allowances lower the church tax through a notional relief:
//! each allowance is worth 9 600 € a year (halved in class IV, nothing in
//! classes V and VI), taxed at the 14 % entry rate. The relief reduces the
//! church tax by at most 30 %.

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::CalculationError;
use crate::calculations::common::truncate_cents;
use crate::calculations::income_tax::MONTHS_PER_YEAR;
use crate::{TaxParameters, UserData};

#[derive(Debug, Clone, Copy)]
pub struct ChurchTaxCalculator<'a> {
    params: &'a TaxParameters,
}

impl<'a> ChurchTaxCalculator<'a> {
    pub fn new(params: &'a TaxParameters) -> Self {
        Self { params }
    }

    /// Monthly church tax on a monthly wage tax of `income_tax`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the profile fails validation.
    pub fn monthly_church_tax(
        &self,
        income_tax: Decimal,
        profile: &UserData,
    ) -> Result<Decimal, CalculationError> {
        profile.validate()?;

        if !profile.church_tax_liable || income_tax <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let rate = self.params.church_tax_rate_for(profile.state);
        let full = income_tax * rate;

        // rate × relief / 12 equals full × relief / (12 × income_tax)
        let relief = rate * self.annual_child_relief(profile) / MONTHS_PER_YEAR;
        let reduction = relief.min(full * self.params.church_tax_max_reduction);
        let church_tax = truncate_cents(full - reduction);

        debug!(
            income_tax = %income_tax,
            rate = %rate,
            reduction = %reduction,
            church_tax = %church_tax,
            "computed church tax"
        );

        Ok(church_tax)
    }

    /// Notional annual wage tax saved by the child allowances.
    fn annual_child_relief(
        &self,
        profile: &UserData,
    ) -> Decimal {
        let notional_allowance = profile.child_allowances
            * self.params.child_allowance_value
            * profile.tax_class.child_allowance_share();
        notional_allowance * self.params.entry_tax_rate
    }
}
