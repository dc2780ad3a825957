use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{FederalState, TaxationType};
use crate::calculations::CalculationError;

/// Statutory constants of one tax year.
///
/// Tariff boundaries are expressed in terms of taxable income *including*
/// the basic allowance (zvE), the way §32a EStG states them. Rates are
/// fractions (`0.42`), not percentages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxParameters {
    pub tax_year: i32,

    // Income tax tariff
    pub basic_allowance: Decimal,
    pub zone_1_end: Decimal,
    pub zone_1_factor: Decimal,
    pub zone_1_base_rate: Decimal,
    pub zone_2_end: Decimal,
    pub zone_2_factor: Decimal,
    pub zone_2_base_rate: Decimal,
    pub zone_2_offset: Decimal,
    pub zone_3_end: Decimal,
    pub zone_3_rate: Decimal,
    pub zone_3_deduction: Decimal,
    pub zone_4_rate: Decimal,
    pub zone_4_deduction: Decimal,

    // Tax class adjustments
    pub single_parent_factor: Decimal,
    pub class_v_factor: Decimal,
    pub class_vi_factor: Decimal,
    pub class_vi_minimum_rate: Decimal,

    // Church tax
    pub church_tax_rate: Decimal,
    pub church_tax_reduced_rate: Decimal,
    pub child_allowance_value: Decimal,
    pub entry_tax_rate: Decimal,
    pub church_tax_max_reduction: Decimal,

    // Social insurance (monthly ceilings, employee shares)
    pub health_care_ceiling: Decimal,
    pub pension_unemployment_ceiling: Decimal,
    pub unemployment_rate: Decimal,
    /// Care rate by number of children, index 0 = one child; the last entry
    /// applies to every larger family.
    pub care_rates_with_children: Vec<Decimal>,
    pub care_rate_childless: Decimal,
    pub care_rate_young_childless: Decimal,
    pub childless_surcharge_age: i32,
    pub care_regional_surcharge: Decimal,
    pub care_surcharge_state: FederalState,

    // Company car
    pub benefit_rate_full: Decimal,
    pub benefit_rate_hybrid: Decimal,
    pub benefit_rate_electric: Decimal,
}

impl TaxParameters {
    /// Tariff, contribution ceilings and rates for 2025.
    pub fn year_2025() -> Self {
        Self {
            tax_year: 2025,

            basic_allowance: dec!(12096),
            zone_1_end: dec!(17443),
            zone_1_factor: dec!(932.30),
            zone_1_base_rate: dec!(1400),
            zone_2_end: dec!(68480),
            zone_2_factor: dec!(176.64),
            zone_2_base_rate: dec!(2397),
            zone_2_offset: dec!(1015.13),
            zone_3_end: dec!(277825),
            zone_3_rate: dec!(0.42),
            zone_3_deduction: dec!(10911.92),
            zone_4_rate: dec!(0.45),
            zone_4_deduction: dec!(19246.67),

            single_parent_factor: dec!(0.90),
            class_v_factor: dec!(1.35),
            class_vi_factor: dec!(1.15),
            class_vi_minimum_rate: dec!(0.27),

            church_tax_rate: dec!(0.09),
            church_tax_reduced_rate: dec!(0.08),
            child_allowance_value: dec!(9600),
            entry_tax_rate: dec!(0.14),
            church_tax_max_reduction: dec!(0.30),

            health_care_ceiling: dec!(5512.50),
            pension_unemployment_ceiling: dec!(8050.00),
            unemployment_rate: dec!(0.026),
            care_rates_with_children: vec![
                dec!(0.018),
                dec!(0.0155),
                dec!(0.013),
                dec!(0.0105),
                dec!(0.008),
            ],
            care_rate_childless: dec!(0.024),
            care_rate_young_childless: dec!(0.018),
            childless_surcharge_age: 23,
            care_regional_surcharge: dec!(0.005),
            care_surcharge_state: FederalState::Sachsen,

            benefit_rate_full: dec!(0.01),
            benefit_rate_hybrid: dec!(0.005),
            benefit_rate_electric: dec!(0.0025),
        }
    }

    /// Parameters for `year`. Only 2025 is modeled.
    pub fn for_year(year: i32) -> Result<Self, CalculationError> {
        match year {
            2025 => Ok(Self::year_2025()),
            other => Err(CalculationError::UnsupportedTaxYear(other)),
        }
    }

    /// Monthly benefit-in-kind rate for a taxation type.
    pub fn benefit_rate(&self, taxation: TaxationType) -> Decimal {
        match taxation {
            TaxationType::Full => self.benefit_rate_full,
            TaxationType::Hybrid => self.benefit_rate_hybrid,
            TaxationType::Electric => self.benefit_rate_electric,
        }
    }

    pub fn church_tax_rate_for(&self, state: FederalState) -> Decimal {
        if state.has_reduced_church_tax() {
            self.church_tax_reduced_rate
        } else {
            self.church_tax_rate
        }
    }
}

impl Default for TaxParameters {
    fn default() -> Self {
        Self::year_2025()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn for_year_only_knows_2025() {
        assert_eq!(TaxParameters::for_year(2025), Ok(TaxParameters::year_2025()));
        assert_eq!(
            TaxParameters::for_year(2024),
            Err(CalculationError::UnsupportedTaxYear(2024))
        );
    }

    #[test]
    fn tariff_zones_are_continuous() {
        let p = TaxParameters::year_2025();

        // End of zone 1 equals start of zone 2 (the zone 2 offset), to the euro.
        let y = (p.zone_1_end - p.basic_allowance) / dec!(10000);
        let zone_1 = (p.zone_1_factor * y + p.zone_1_base_rate) * y;
        assert_eq!(zone_1.trunc(), p.zone_2_offset.trunc());

        // End of zone 2 meets the linear zone 3.
        let z = (p.zone_2_end - p.zone_1_end) / dec!(10000);
        let zone_2 = (p.zone_2_factor * z + p.zone_2_base_rate) * z + p.zone_2_offset;
        let zone_3 = p.zone_3_rate * p.zone_2_end - p.zone_3_deduction;
        assert!((zone_2 - zone_3).abs() < Decimal::ONE);
    }

    #[test]
    fn benefit_rates_by_taxation() {
        let p = TaxParameters::year_2025();
        assert_eq!(p.benefit_rate(TaxationType::Full), dec!(0.01));
        assert_eq!(p.benefit_rate(TaxationType::Hybrid), dec!(0.005));
        assert_eq!(p.benefit_rate(TaxationType::Electric), dec!(0.0025));
    }

    #[test]
    fn church_tax_rate_depends_on_state() {
        let p = TaxParameters::year_2025();
        assert_eq!(p.church_tax_rate_for(FederalState::Bayern), dec!(0.08));
        assert_eq!(p.church_tax_rate_for(FederalState::Hessen), dec!(0.09));
    }
}
