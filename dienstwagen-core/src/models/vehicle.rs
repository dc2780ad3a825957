use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseError;
use crate::calculations::CalculationError;

/// How the private use of a company car is taxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxationType {
    /// Combustion engine: 1 % of the list price per month.
    #[default]
    Full,
    /// Plug-in hybrid: 0.5 %.
    Hybrid,
    /// Battery electric: 0.25 %.
    Electric,
}

impl TaxationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Hybrid => "hybrid",
            Self::Electric => "electric",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "full" | "voll" => Some(Self::Full),
            "hybrid" => Some(Self::Hybrid),
            "electric" | "elektro" => Some(Self::Electric),
            _ => None,
        }
    }
}

impl FromStr for TaxationType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseError::TaxationType(s.to_string()))
    }
}

impl fmt::Display for TaxationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The employee's own monthly contribution towards the car (Eigenanteil).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CoPaymentPolicy {
    /// No contribution.
    None,
    /// A fixed monthly amount.
    Fixed {
        #[serde(rename = "monthlyAmount")]
        monthly_amount: Decimal,
    },
    /// `percentage` percent of the list price above `threshold`, per month.
    Percentage {
        percentage: Decimal,
        threshold: Decimal,
    },
}

impl Default for CoPaymentPolicy {
    /// 1.5 % of the list price above 45 000.
    fn default() -> Self {
        Self::Percentage {
            percentage: dec!(1.5),
            threshold: dec!(45000),
        }
    }
}

impl CoPaymentPolicy {
    pub fn validate(&self) -> Result<(), CalculationError> {
        match *self {
            Self::None => Ok(()),
            Self::Fixed { monthly_amount } if monthly_amount < Decimal::ZERO => {
                Err(CalculationError::NegativeFixedCoPayment(monthly_amount))
            }
            Self::Fixed { monthly_amount } => {
                CalculationError::check_amount("fixed co-payment", monthly_amount)
            }
            Self::Percentage {
                percentage,
                threshold,
            } => {
                if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
                    return Err(CalculationError::InvalidCoPaymentPercentage(percentage));
                }
                if threshold < Decimal::ZERO {
                    return Err(CalculationError::NegativeCoPaymentThreshold(threshold));
                }
                CalculationError::check_amount("co-payment threshold", threshold)
            }
        }
    }
}

/// A company car offer to compare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    /// Gross list price (Bruttolistenpreis) in euros.
    pub list_price: Decimal,
    pub taxation: TaxationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configurator_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configurator_link: Option<String>,
    /// `None` means the default policy applies, see [`Vehicle::effective_co_payment`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_payment: Option<CoPaymentPolicy>,
}

impl Vehicle {
    /// Creates a vehicle with a fresh id and no optional details.
    pub fn new(name: impl Into<String>, list_price: Decimal, taxation: TaxationType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            list_price,
            taxation,
            configurator_code: None,
            configurator_link: None,
            co_payment: None,
        }
    }

    pub fn with_co_payment(mut self, policy: CoPaymentPolicy) -> Self {
        self.co_payment = Some(policy);
        self
    }

    pub fn effective_co_payment(&self) -> CoPaymentPolicy {
        self.co_payment.unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns [`CalculationError`] if the list price is not positive or too
    /// large, or the co-payment policy carries out-of-range values.
    pub fn validate(&self) -> Result<(), CalculationError> {
        if self.list_price <= Decimal::ZERO {
            return Err(CalculationError::NonPositiveListPrice(self.list_price));
        }
        CalculationError::check_amount("list price", self.list_price)?;
        self.effective_co_payment().validate()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn taxation_type_parses_english_and_german_names() {
        assert_eq!(TaxationType::parse("full"), Some(TaxationType::Full));
        assert_eq!(TaxationType::parse("Voll"), Some(TaxationType::Full));
        assert_eq!(TaxationType::parse("elektro"), Some(TaxationType::Electric));
        assert_eq!(TaxationType::parse("HYBRID"), Some(TaxationType::Hybrid));
        assert_eq!(
            "diesel".parse::<TaxationType>(),
            Err(ParseError::TaxationType("diesel".to_string()))
        );
    }

    #[test]
    fn missing_policy_falls_back_to_default() {
        let car = Vehicle::new("Kombi", dec!(50000), TaxationType::Full);
        assert_eq!(
            car.effective_co_payment(),
            CoPaymentPolicy::Percentage {
                percentage: dec!(1.5),
                threshold: dec!(45000),
            }
        );
    }

    #[test]
    fn policy_json_is_tagged() {
        let fixed = CoPaymentPolicy::Fixed {
            monthly_amount: dec!(150),
        };
        let json = serde_json::to_value(fixed).unwrap();
        assert_eq!(json["type"], "fixed");
        assert_eq!(json["monthlyAmount"], "150");

        let none: CoPaymentPolicy = serde_json::from_str(r#"{"type":"none"}"#).unwrap();
        assert_eq!(none, CoPaymentPolicy::None);

        let pct: CoPaymentPolicy =
            serde_json::from_str(r#"{"type":"percentage","percentage":1.0,"threshold":47000}"#)
                .unwrap();
        assert_eq!(
            pct,
            CoPaymentPolicy::Percentage {
                percentage: dec!(1.0),
                threshold: dec!(47000),
            }
        );
    }

    #[test]
    fn validate_rejects_non_positive_list_price() {
        let car = Vehicle::new("Gratis", Decimal::ZERO, TaxationType::Electric);
        assert_eq!(
            car.validate(),
            Err(CalculationError::NonPositiveListPrice(Decimal::ZERO))
        );
    }

    #[test]
    fn validate_rejects_bad_policies() {
        let car = Vehicle::new("A", dec!(40000), TaxationType::Full).with_co_payment(
            CoPaymentPolicy::Fixed {
                monthly_amount: dec!(-10),
            },
        );
        assert_eq!(
            car.validate(),
            Err(CalculationError::NegativeFixedCoPayment(dec!(-10)))
        );

        let car = Vehicle::new("B", dec!(40000), TaxationType::Full).with_co_payment(
            CoPaymentPolicy::Percentage {
                percentage: dec!(150),
                threshold: dec!(0),
            },
        );
        assert_eq!(
            car.validate(),
            Err(CalculationError::InvalidCoPaymentPercentage(dec!(150)))
        );

        let car = Vehicle::new("C", dec!(40000), TaxationType::Full).with_co_payment(
            CoPaymentPolicy::Percentage {
                percentage: dec!(1),
                threshold: dec!(-1),
            },
        );
        assert_eq!(
            car.validate(),
            Err(CalculationError::NegativeCoPaymentThreshold(dec!(-1)))
        );
    }

    #[test]
    fn validate_rejects_amounts_above_limit() {
        let car = Vehicle::new("Yacht", dec!(500000000000000000000), TaxationType::Full);
        assert_eq!(
            car.validate(),
            Err(CalculationError::AmountTooLarge {
                name: "list price",
                value: dec!(500000000000000000000),
            })
        );

        let car = Vehicle::new("A", dec!(40000), TaxationType::Full).with_co_payment(
            CoPaymentPolicy::Fixed {
                monthly_amount: dec!(1000000000000000),
            },
        );
        assert_eq!(
            car.validate(),
            Err(CalculationError::AmountTooLarge {
                name: "fixed co-payment",
                value: dec!(1000000000000000),
            })
        );
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let car = Vehicle::new("Kombi", dec!(50000), TaxationType::Hybrid);
        let json = serde_json::to_value(&car).unwrap();
        assert!(json.get("coPayment").is_none());
        assert!(json.get("configuratorCode").is_none());
        assert_eq!(json["taxation"], "hybrid");
    }
}
