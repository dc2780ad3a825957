use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FederalState, TaxClass};
use crate::calculations::CalculationError;

/// Name given to profiles created automatically when none exist.
pub const DEFAULT_PROFILE_NAME: &str = "Standard-Profil";

/// Personal payroll data a calculation runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    /// Monthly gross salary in euros.
    pub gross_monthly_salary: Decimal,
    pub tax_class: TaxClass,
    pub state: FederalState,
    pub birth_year: i32,
    /// Number of child allowances (Kinderfreibeträge); may be fractional.
    pub child_allowances: Decimal,
    /// Monthly tax-free amount registered with the tax office.
    pub monthly_tax_free_allowance: Decimal,
    pub church_tax_liable: bool,
    /// Total pension insurance rate in percent (e.g. `18.6`).
    pub pension_rate: Decimal,
    /// General health insurance rate in percent (e.g. `14.6`).
    pub health_rate: Decimal,
    /// Health insurer's additional contribution in percent (e.g. `1.3`).
    pub health_surcharge_rate: Decimal,
}

impl Default for UserData {
    fn default() -> Self {
        Self {
            gross_monthly_salary: Decimal::ZERO,
            tax_class: TaxClass::I,
            state: FederalState::Bayern,
            birth_year: 1980,
            child_allowances: Decimal::ZERO,
            monthly_tax_free_allowance: Decimal::ZERO,
            church_tax_liable: false,
            pension_rate: dec!(18.6),
            health_rate: dec!(14.6),
            health_surcharge_rate: dec!(1.3),
        }
    }
}

impl UserData {
    /// Checks that every amount and rate is within its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if:
    /// - the gross salary, tax-free allowance or child allowances are negative
    ///   or above [`MAX_AMOUNT`](crate::calculations::MAX_AMOUNT)
    /// - any insurance rate is outside `0..=100`
    pub fn validate(&self) -> Result<(), CalculationError> {
        if self.gross_monthly_salary < Decimal::ZERO {
            return Err(CalculationError::NegativeGrossSalary(
                self.gross_monthly_salary,
            ));
        }
        if self.monthly_tax_free_allowance < Decimal::ZERO {
            return Err(CalculationError::NegativeTaxFreeAllowance(
                self.monthly_tax_free_allowance,
            ));
        }
        if self.child_allowances < Decimal::ZERO {
            return Err(CalculationError::NegativeChildAllowances(
                self.child_allowances,
            ));
        }
        CalculationError::check_amount("gross monthly salary", self.gross_monthly_salary)?;
        CalculationError::check_amount(
            "monthly tax-free allowance",
            self.monthly_tax_free_allowance,
        )?;
        CalculationError::check_amount("number of child allowances", self.child_allowances)?;
        for (name, value) in [
            ("pension rate", self.pension_rate),
            ("health rate", self.health_rate),
            ("health surcharge rate", self.health_surcharge_rate),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                return Err(CalculationError::InvalidRate { name, value });
            }
        }
        Ok(())
    }

    /// Age reached in `year`, the way contribution rules count it.
    pub fn age_in(&self, year: i32) -> i32 {
        year - self.birth_year
    }
}

/// A named set of [`UserData`]. Exactly one stored profile is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub user_data: UserData,
}

impl UserProfile {
    /// Creates a profile with a fresh random id.
    pub fn new(name: impl Into<String>, user_data: UserData) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            user_data,
        }
    }

    /// The profile created whenever the profile set would otherwise be empty.
    pub fn standard() -> Self {
        Self::new(DEFAULT_PROFILE_NAME, UserData::default())
    }
}

/// Partial update of a profile's [`UserData`]; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub gross_monthly_salary: Option<Decimal>,
    pub tax_class: Option<TaxClass>,
    pub state: Option<FederalState>,
    pub birth_year: Option<i32>,
    pub child_allowances: Option<Decimal>,
    pub monthly_tax_free_allowance: Option<Decimal>,
    pub church_tax_liable: Option<bool>,
    pub pension_rate: Option<Decimal>,
    pub health_rate: Option<Decimal>,
    pub health_surcharge_rate: Option<Decimal>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns a copy of `data` with every set field replaced.
    pub fn apply(&self, data: &UserData) -> UserData {
        UserData {
            gross_monthly_salary: self
                .gross_monthly_salary
                .unwrap_or(data.gross_monthly_salary),
            tax_class: self.tax_class.unwrap_or(data.tax_class),
            state: self.state.unwrap_or(data.state),
            birth_year: self.birth_year.unwrap_or(data.birth_year),
            child_allowances: self.child_allowances.unwrap_or(data.child_allowances),
            monthly_tax_free_allowance: self
                .monthly_tax_free_allowance
                .unwrap_or(data.monthly_tax_free_allowance),
            church_tax_liable: self.church_tax_liable.unwrap_or(data.church_tax_liable),
            pension_rate: self.pension_rate.unwrap_or(data.pension_rate),
            health_rate: self.health_rate.unwrap_or(data.health_rate),
            health_surcharge_rate: self
                .health_surcharge_rate
                .unwrap_or(data.health_surcharge_rate),
        }
    }
}
