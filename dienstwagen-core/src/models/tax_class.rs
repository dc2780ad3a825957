use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ParseError;

/// German wage-tax class (Steuerklasse).
///
/// Serialized as its number (`1`..=`6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaxClass {
    #[default]
    I,
    II,
    III,
    IV,
    V,
    VI,
}

impl TaxClass {
    pub fn all() -> &'static [TaxClass] {
        &[
            TaxClass::I,
            TaxClass::II,
            TaxClass::III,
            TaxClass::IV,
            TaxClass::V,
            TaxClass::VI,
        ]
    }

    pub fn number(&self) -> u8 {
        match self {
            Self::I => 1,
            Self::II => 2,
            Self::III => 3,
            Self::IV => 4,
            Self::V => 5,
            Self::VI => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
            Self::V => "V",
            Self::VI => "VI",
        }
    }

    /// Accepts the class number (`"3"`) or the roman numeral (`"III"`, any case).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(number) = s.parse::<u8>() {
            return Self::try_from(number).ok();
        }
        Self::all()
            .iter()
            .copied()
            .find(|class| class.as_str().eq_ignore_ascii_case(s))
    }

    /// Share of a full child allowance credited in this class.
    ///
    /// Classes I to III carry the full allowance, class IV half of it
    /// (the spouse carries the other half), classes V and VI none.
    pub fn child_allowance_share(&self) -> Decimal {
        match self {
            Self::I | Self::II | Self::III => Decimal::ONE,
            Self::IV => dec!(0.5),
            Self::V | Self::VI => Decimal::ZERO,
        }
    }
}

impl TryFrom<u8> for TaxClass {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::I),
            2 => Ok(Self::II),
            3 => Ok(Self::III),
            4 => Ok(Self::IV),
            5 => Ok(Self::V),
            6 => Ok(Self::VI),
            other => Err(ParseError::TaxClass(other.to_string())),
        }
    }
}

impl From<TaxClass> for u8 {
    fn from(class: TaxClass) -> Self {
        class.number()
    }
}

impl FromStr for TaxClass {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseError::TaxClass(s.to_string()))
    }
}

impl fmt::Display for TaxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_accepts_numbers_and_roman_numerals() {
        assert_eq!(TaxClass::parse("1"), Some(TaxClass::I));
        assert_eq!(TaxClass::parse("III"), Some(TaxClass::III));
        assert_eq!(TaxClass::parse("vi"), Some(TaxClass::VI));
        assert_eq!(TaxClass::parse(" 4 "), Some(TaxClass::IV));
    }

    #[test]
    fn parse_rejects_unknown_classes() {
        assert_eq!(TaxClass::parse("0"), None);
        assert_eq!(TaxClass::parse("7"), None);
        assert_eq!(TaxClass::parse("VII"), None);
        assert_eq!(
            "x".parse::<TaxClass>(),
            Err(ParseError::TaxClass("x".to_string()))
        );
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&TaxClass::III).unwrap();
        assert_eq!(json, "3");

        let class: TaxClass = serde_json::from_str("5").unwrap();
        assert_eq!(class, TaxClass::V);

        assert!(serde_json::from_str::<TaxClass>("9").is_err());
    }

    #[test]
    fn child_allowance_share_by_class() {
        assert_eq!(TaxClass::I.child_allowance_share(), Decimal::ONE);
        assert_eq!(TaxClass::III.child_allowance_share(), Decimal::ONE);
        assert_eq!(TaxClass::IV.child_allowance_share(), dec!(0.5));
        assert_eq!(TaxClass::V.child_allowance_share(), Decimal::ZERO);
        assert_eq!(TaxClass::VI.child_allowance_share(), Decimal::ZERO);
    }
}
