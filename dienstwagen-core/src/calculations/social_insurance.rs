//! Employee share of statutory social insurance.
//!
//! Four branches, each on its own capped base:
//!
//! | Branch        | Ceiling (monthly) | Employee rate |
//! |---------------|-------------------|---------------|
//! | Health        | 5 512.50          | (general + surcharge) / 2 |
//! | Long-term care| 5 512.50          | tiered by children and age, +0.5 % in Sachsen |
//! | Pension       | 8 050.00          | pension rate / 2 |
//! | Unemployment  | 8 050.00          | 2.6 % / 2 |
//!
//! Every branch is rounded half-up to the cent and the total is the sum of
//! the rounded branches.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::CalculationError;
use crate::calculations::common::round_half_up;
use crate::{TaxParameters, UserData};

const EMPLOYEE_SHARE: Decimal = dec!(2);

/// Monthly employee contributions, in euros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialInsuranceContributions {
    pub health: Decimal,
    pub care: Decimal,
    pub pension: Decimal,
    pub unemployment: Decimal,
    pub total: Decimal,
}

impl SocialInsuranceContributions {
    pub fn zero() -> Self {
        Self {
            health: Decimal::ZERO,
            care: Decimal::ZERO,
            pension: Decimal::ZERO,
            unemployment: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SocialInsuranceCalculator<'a> {
    params: &'a TaxParameters,
}

impl<'a> SocialInsuranceCalculator<'a> {
    pub fn new(params: &'a TaxParameters) -> Self {
        Self { params }
    }

    /// Contributions on `gross_monthly` for the given profile.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the profile fails validation.
    pub fn contributions(
        &self,
        gross_monthly: Decimal,
        profile: &UserData,
    ) -> Result<SocialInsuranceContributions, CalculationError> {
        profile.validate()?;

        if gross_monthly <= Decimal::ZERO {
            warn!(gross = %gross_monthly, "non-positive gross salary; no contributions due");
            return Ok(SocialInsuranceContributions::zero());
        }

        let p = self.params;
        let health_care_base = gross_monthly.min(p.health_care_ceiling);
        let pension_base = gross_monthly.min(p.pension_unemployment_ceiling);

        let health = round_half_up(
            health_care_base * (profile.health_rate + profile.health_surcharge_rate)
                / EMPLOYEE_SHARE
                / Decimal::ONE_HUNDRED,
        );
        let care = round_half_up(health_care_base * self.care_rate(profile));
        let pension = round_half_up(
            pension_base * profile.pension_rate / EMPLOYEE_SHARE / Decimal::ONE_HUNDRED,
        );
        let unemployment = round_half_up(pension_base * p.unemployment_rate / EMPLOYEE_SHARE);

        let contributions = SocialInsuranceContributions {
            health,
            care,
            pension,
            unemployment,
            total: health + care + pension + unemployment,
        };

        debug!(
            gross = %gross_monthly,
            health = %health,
            care = %care,
            pension = %pension,
            unemployment = %unemployment,
            "computed social insurance"
        );

        Ok(contributions)
    }

    /// Employee care insurance rate as a fraction.
    ///
    /// Partial child allowances count as a whole child.
    pub fn care_rate(
        &self,
        profile: &UserData,
    ) -> Decimal {
        let p = self.params;
        let children = profile.child_allowances.ceil();

        let base = if children > Decimal::ZERO {
            let tiers = &p.care_rates_with_children;
            let count = children.to_usize().unwrap_or(usize::MAX);
            let index = count.min(tiers.len()).saturating_sub(1);
            tiers.get(index).copied().unwrap_or(p.care_rate_young_childless)
        } else if profile.age_in(p.tax_year) > p.childless_surcharge_age {
            p.care_rate_childless
        } else {
            p.care_rate_young_childless
        };

        if profile.state == p.care_surcharge_state {
            base + p.care_regional_surcharge
        } else {
            base
        }
    }
}
