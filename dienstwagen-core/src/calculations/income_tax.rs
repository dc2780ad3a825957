//! Monthly wage tax (Lohnsteuer).
//!
//! # Procedure
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Annual gross = monthly gross × 12, cut to whole euros |
//! | 2    | Taxable income = annual gross − 12 × monthly allowance − basic allowance, at least 0 |
//! | 3    | Tariff: four zones over taxable income (see below) |
//! | 4    | Tax class adjustment |
//! | 5    | Monthly tax = annual tax ÷ 12, cut to whole cents |
//!
//! The tariff zones follow §32a EStG. With `zvE` = taxable income plus the
//! basic allowance:
//!
//! | Zone | Range (zvE)            | Formula |
//! |------|------------------------|---------|
//! | 1    | up to 17 443           | `(932.30·y + 1 400)·y`, `y = (zvE − 12 096) / 10 000` |
//! | 2    | up to 68 480           | `(176.64·z + 2 397)·z + 1 015.13`, `z = (zvE − 17 443) / 10 000` |
//! | 3    | up to 277 825          | `0.42·zvE − 10 911.92` |
//! | 4    | above                  | `0.45·zvE − 19 246.67` |
//!
//! `y` and `z` are cut to six decimal places and every zone result to whole
//! euros.
//!
//! # Tax classes
//!
//! | Class  | Adjustment |
//! |--------|------------|
//! | I, IV  | none |
//! | II     | base tax × 0.90 |
//! | III    | splitting: taxable income with the doubled basic allowance is halved, taxed, and the tax doubled |
//! | V      | base tax × 1.35 |
//! | VI     | greater of taxable income × 0.27 and base tax × 1.15 |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use dienstwagen_core::calculations::IncomeTaxCalculator;
//! use dienstwagen_core::{TaxParameters, UserData};
//!
//! let params = TaxParameters::year_2025();
//! let calculator = IncomeTaxCalculator::new(&params);
//!
//! let tax = calculator
//!     .monthly_income_tax(dec!(5000), &UserData::default())
//!     .unwrap();
//!
//! assert_eq!(tax, dec!(1201.25));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::calculations::CalculationError;
use crate::calculations::common::{max, truncate_cents, truncate_dp, truncate_euros};
use crate::{TaxClass, TaxParameters, UserData};

pub(crate) const MONTHS_PER_YEAR: Decimal = dec!(12);
const TARIFF_STEP: Decimal = dec!(10000);

/// Calculator for monthly wage tax.
#[derive(Debug, Clone, Copy)]
pub struct IncomeTaxCalculator<'a> {
    params: &'a TaxParameters,
}

impl<'a> IncomeTaxCalculator<'a> {
    pub fn new(params: &'a TaxParameters) -> Self {
        Self { params }
    }

    /// Monthly wage tax on `gross_monthly` for the given profile.
    ///
    /// The profile's own gross salary is ignored; only its tax class,
    /// allowance and validity matter.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the profile fails validation or the
    /// annual gross cannot be represented.
    pub fn monthly_income_tax(
        &self,
        gross_monthly: Decimal,
        profile: &UserData,
    ) -> Result<Decimal, CalculationError> {
        profile.validate()?;

        if gross_monthly <= Decimal::ZERO {
            warn!(gross = %gross_monthly, "non-positive gross salary; no income tax due");
            return Ok(Decimal::ZERO);
        }

        let annual_tax = self.annual_income_tax(gross_monthly, profile)?;
        let monthly_tax = truncate_cents(annual_tax / MONTHS_PER_YEAR);

        debug!(
            gross = %gross_monthly,
            tax_class = %profile.tax_class,
            annual_tax = %annual_tax,
            monthly_tax = %monthly_tax,
            "computed income tax"
        );

        Ok(monthly_tax)
    }

    /// Annual tax in whole euros, after the tax class adjustment.
    fn annual_income_tax(
        &self,
        gross_monthly: Decimal,
        profile: &UserData,
    ) -> Result<Decimal, CalculationError> {
        let annual_gross = gross_monthly
            .checked_mul(MONTHS_PER_YEAR)
            .map(truncate_euros)
            .ok_or(CalculationError::AmountTooLarge {
                name: "gross monthly salary",
                value: gross_monthly,
            })?;
        let annual_allowance = profile.monthly_tax_free_allowance * MONTHS_PER_YEAR;

        if profile.tax_class == TaxClass::III {
            return Ok(self.splitting_tax(annual_gross, annual_allowance));
        }

        let taxable = self.taxable_income(annual_gross, annual_allowance, Decimal::ONE);
        let base_tax = self.tariff(taxable);

        Ok(match profile.tax_class {
            TaxClass::I | TaxClass::IV | TaxClass::III => base_tax,
            TaxClass::II => truncate_euros(base_tax * self.params.single_parent_factor),
            TaxClass::V => truncate_euros(base_tax * self.params.class_v_factor),
            TaxClass::VI => max(
                truncate_euros(taxable * self.params.class_vi_minimum_rate),
                truncate_euros(base_tax * self.params.class_vi_factor),
            ),
        })
    }

    /// Taxable income after the allowance and `basic_allowances` times the
    /// basic allowance, in whole euros and never negative.
    pub fn taxable_income(
        &self,
        annual_gross: Decimal,
        annual_allowance: Decimal,
        basic_allowances: Decimal,
    ) -> Decimal {
        let remaining =
            annual_gross - annual_allowance - self.params.basic_allowance * basic_allowances;
        max(truncate_euros(remaining), Decimal::ZERO)
    }

    /// Joint assessment: halve the income, tax it, double the tax.
    fn splitting_tax(
        &self,
        annual_gross: Decimal,
        annual_allowance: Decimal,
    ) -> Decimal {
        let taxable = self.taxable_income(annual_gross, annual_allowance, Decimal::TWO);
        let half = truncate_euros(taxable / Decimal::TWO);
        self.tariff(half) * Decimal::TWO
    }

    /// Annual tariff tax on taxable income (basic allowance already removed).
    ///
    /// Taxable income below one euro carries no tax.
    pub fn tariff(
        &self,
        taxable: Decimal,
    ) -> Decimal {
        if taxable < Decimal::ONE {
            return Decimal::ZERO;
        }

        let p = self.params;
        let zve = taxable + p.basic_allowance;

        let tax = if zve <= p.zone_1_end {
            let y = truncate_dp(taxable / TARIFF_STEP, 6);
            (p.zone_1_factor * y + p.zone_1_base_rate) * y
        } else if zve <= p.zone_2_end {
            let z = truncate_dp((zve - p.zone_1_end) / TARIFF_STEP, 6);
            (p.zone_2_factor * z + p.zone_2_base_rate) * z + p.zone_2_offset
        } else if zve <= p.zone_3_end {
            p.zone_3_rate * zve - p.zone_3_deduction
        } else {
            p.zone_4_rate * zve - p.zone_4_deduction
        };

        truncate_euros(tax)
    }
}
