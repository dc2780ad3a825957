//! Net income with and without a company car.
//!
//! # Procedure
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Co-payment and benefit for the vehicle |
//! | 2    | Adjusted gross = gross − co-payment |
//! | 3    | Social insurance on the adjusted gross (the benefit is exempt) |
//! | 4    | Wage and church tax on adjusted gross + benefit |
//! | 5    | Net with car = adjusted gross − taxes − social insurance |
//! | 6    | Net without car: steps 3–5 on the unadjusted gross, no benefit |
//! | 7    | Tax burden of the benefit = taxes of step 4 − taxes on the adjusted gross alone |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use dienstwagen_core::calculations::NetIncomeComparator;
//! use dienstwagen_core::{TaxParameters, TaxationType, UserData, Vehicle};
//!
//! let params = TaxParameters::year_2025();
//! let comparator = NetIncomeComparator::new(&params);
//!
//! let profile = UserData {
//!     gross_monthly_salary: dec!(5000),
//!     ..UserData::default()
//! };
//! let car = Vehicle::new("Kombi", dec!(60000), TaxationType::Full);
//!
//! let result = comparator.compare(&profile, &car).unwrap();
//! assert_eq!(result.net_delta, dec!(-327.12));
//! ```

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calculations::{
    CalculationError, ChurchTaxCalculator, CompanyCarCalculator, IncomeTaxCalculator,
    SocialInsuranceCalculator, SocialInsuranceContributions,
};
use crate::{TaxParameters, UserData, Vehicle};

/// One month's pay from gross to net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetIncomeBreakdown {
    /// Cash gross, after any co-payment.
    pub gross: Decimal,
    /// Gross the wage tax was assessed on, including any benefit.
    pub taxable_gross: Decimal,
    pub income_tax: Decimal,
    pub church_tax: Decimal,
    pub social_insurance: SocialInsuranceContributions,
    pub net: Decimal,
}

/// Outcome of comparing one vehicle against no company car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub net_without_car: Decimal,
    pub net_with_car: Decimal,
    /// Negative when the car costs net income.
    pub net_delta: Decimal,
    pub benefit: Decimal,
    /// Wage and church tax caused by the benefit alone.
    pub tax_burden: Decimal,
    /// The benefit is exempt from social insurance; always zero.
    pub social_insurance_burden: Decimal,
    pub co_payment: Decimal,
    pub without_car: NetIncomeBreakdown,
    pub with_car: NetIncomeBreakdown,
}

/// A per-vehicle entry of a batch comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleComparison {
    pub vehicle_id: Uuid,
    pub vehicle_name: String,
    pub result: Result<ComparisonResult, CalculationError>,
}

#[derive(Debug, Clone, Copy)]
pub struct NetIncomeComparator<'a> {
    income_tax: IncomeTaxCalculator<'a>,
    social_insurance: SocialInsuranceCalculator<'a>,
    church_tax: ChurchTaxCalculator<'a>,
    company_car: CompanyCarCalculator<'a>,
}

impl<'a> NetIncomeComparator<'a> {
    pub fn new(params: &'a TaxParameters) -> Self {
        Self {
            income_tax: IncomeTaxCalculator::new(params),
            social_insurance: SocialInsuranceCalculator::new(params),
            church_tax: ChurchTaxCalculator::new(params),
            company_car: CompanyCarCalculator::new(params),
        }
    }

    /// Net income on the profile's own gross salary, without a car.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the profile fails validation.
    pub fn net_income(
        &self,
        profile: &UserData,
    ) -> Result<NetIncomeBreakdown, CalculationError> {
        let gross = profile.gross_monthly_salary;
        self.breakdown(gross, gross, profile)
    }

    /// Compares the profile's net income with and without `vehicle`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the profile or vehicle fails validation.
    pub fn compare(
        &self,
        profile: &UserData,
        vehicle: &Vehicle,
    ) -> Result<ComparisonResult, CalculationError> {
        profile.validate()?;

        let co_payment = self.company_car.co_payment(vehicle)?;
        let benefit = self.company_car.benefit(vehicle)?;

        let adjusted_gross = profile.gross_monthly_salary - co_payment;
        if adjusted_gross < Decimal::ZERO {
            warn!(
                vehicle = %vehicle.name,
                gross = %profile.gross_monthly_salary,
                co_payment = %co_payment,
                "co-payment exceeds gross salary"
            );
        }

        let with_car = self.breakdown(adjusted_gross, adjusted_gross + benefit, profile)?;
        let without_car = self.net_income(profile)?;

        let tax_without_benefit = self.income_tax.monthly_income_tax(adjusted_gross, profile)?;
        let church_without_benefit = self
            .church_tax
            .monthly_church_tax(tax_without_benefit, profile)?;
        let tax_burden = (with_car.income_tax - tax_without_benefit)
            + (with_car.church_tax - church_without_benefit);

        let result = ComparisonResult {
            net_without_car: without_car.net,
            net_with_car: with_car.net,
            net_delta: with_car.net - without_car.net,
            benefit,
            tax_burden,
            social_insurance_burden: Decimal::ZERO,
            co_payment,
            without_car,
            with_car,
        };

        debug!(
            vehicle = %vehicle.name,
            benefit = %benefit,
            co_payment = %co_payment,
            net_delta = %result.net_delta,
            "compared vehicle"
        );

        Ok(result)
    }

    /// Compares every vehicle in parallel. Results keep the input order and
    /// a failing vehicle only fails its own entry.
    pub fn compare_all(
        &self,
        profile: &UserData,
        vehicles: &[Vehicle],
    ) -> Vec<VehicleComparison> {
        vehicles
            .par_iter()
            .map(|vehicle| VehicleComparison {
                vehicle_id: vehicle.id,
                vehicle_name: vehicle.name.clone(),
                result: self.compare(profile, vehicle),
            })
            .collect()
    }

    /// Social insurance on `gross`, taxes on `taxable_gross`.
    fn breakdown(
        &self,
        gross: Decimal,
        taxable_gross: Decimal,
        profile: &UserData,
    ) -> Result<NetIncomeBreakdown, CalculationError> {
        let social_insurance = self.social_insurance.contributions(gross, profile)?;
        let income_tax = self.income_tax.monthly_income_tax(taxable_gross, profile)?;
        let church_tax = self.church_tax.monthly_church_tax(income_tax, profile)?;

        Ok(NetIncomeBreakdown {
            gross,
            taxable_gross,
            income_tax,
            church_tax,
            social_insurance,
            net: gross - income_tax - church_tax - social_insurance.total,
        })
    }
}
