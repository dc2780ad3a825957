use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseError;

/// German federal state (Bundesland), serialized by its German name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FederalState {
    #[serde(rename = "Baden-Württemberg")]
    BadenWuerttemberg,
    #[default]
    #[serde(rename = "Bayern")]
    Bayern,
    #[serde(rename = "Berlin")]
    Berlin,
    #[serde(rename = "Brandenburg")]
    Brandenburg,
    #[serde(rename = "Bremen")]
    Bremen,
    #[serde(rename = "Hamburg")]
    Hamburg,
    #[serde(rename = "Hessen")]
    Hessen,
    #[serde(rename = "Mecklenburg-Vorpommern")]
    MecklenburgVorpommern,
    #[serde(rename = "Niedersachsen")]
    Niedersachsen,
    #[serde(rename = "Nordrhein-Westfalen")]
    NordrheinWestfalen,
    #[serde(rename = "Rheinland-Pfalz")]
    RheinlandPfalz,
    #[serde(rename = "Saarland")]
    Saarland,
    #[serde(rename = "Sachsen")]
    Sachsen,
    #[serde(rename = "Sachsen-Anhalt")]
    SachsenAnhalt,
    #[serde(rename = "Schleswig-Holstein")]
    SchleswigHolstein,
    #[serde(rename = "Thüringen")]
    Thueringen,
}

impl FederalState {
    pub fn all() -> &'static [FederalState] {
        &[
            Self::BadenWuerttemberg,
            Self::Bayern,
            Self::Berlin,
            Self::Brandenburg,
            Self::Bremen,
            Self::Hamburg,
            Self::Hessen,
            Self::MecklenburgVorpommern,
            Self::Niedersachsen,
            Self::NordrheinWestfalen,
            Self::RheinlandPfalz,
            Self::Saarland,
            Self::Sachsen,
            Self::SachsenAnhalt,
            Self::SchleswigHolstein,
            Self::Thueringen,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadenWuerttemberg => "Baden-Württemberg",
            Self::Bayern => "Bayern",
            Self::Berlin => "Berlin",
            Self::Brandenburg => "Brandenburg",
            Self::Bremen => "Bremen",
            Self::Hamburg => "Hamburg",
            Self::Hessen => "Hessen",
            Self::MecklenburgVorpommern => "Mecklenburg-Vorpommern",
            Self::Niedersachsen => "Niedersachsen",
            Self::NordrheinWestfalen => "Nordrhein-Westfalen",
            Self::RheinlandPfalz => "Rheinland-Pfalz",
            Self::Saarland => "Saarland",
            Self::Sachsen => "Sachsen",
            Self::SachsenAnhalt => "Sachsen-Anhalt",
            Self::SchleswigHolstein => "Schleswig-Holstein",
            Self::Thueringen => "Thüringen",
        }
    }

    /// Case-insensitive lookup by German name. `ue` is accepted for `ü`.
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = normalize(s);
        Self::all()
            .iter()
            .copied()
            .find(|state| normalize(state.as_str()) == wanted)
    }

    /// Bayern and Baden-Württemberg levy church tax at 8 % instead of 9 %.
    pub fn has_reduced_church_tax(&self) -> bool {
        matches!(self, Self::Bayern | Self::BadenWuerttemberg)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace('ü', "ue")
}

impl FromStr for FederalState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseError::FederalState(s.to_string()))
    }
}

impl fmt::Display for FederalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
