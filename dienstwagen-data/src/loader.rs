use std::io::Read;

use dienstwagen_core::{
    CalculationError, CoPaymentPolicy, ConfigRepository, RepositoryError, TaxationType, Vehicle,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading vehicle data.
///
/// `line` is the 1-based line in the CSV file, counting the header.
#[derive(Debug, Error)]
pub enum VehicleLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("line {line}: unknown taxation type '{value}'")]
    InvalidTaxation { line: usize, value: String },

    #[error("line {line}: unknown co-payment type '{value}' (expected none, fixed or percentage)")]
    InvalidCoPaymentType { line: usize, value: String },

    #[error("line {line}: co-payment type requires '{field}'")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: {source}")]
    InvalidVehicle {
        line: usize,
        source: CalculationError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for VehicleLoaderError {
    fn from(err: csv::Error) -> Self {
        VehicleLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the vehicles CSV file.
///
/// - `name`: display name
/// - `list_price`: gross list price in euros
/// - `taxation`: `full`, `hybrid` or `electric` (German `voll`/`elektro` accepted)
/// - `co_payment_type`: `none`, `fixed`, `percentage`, or empty for the default policy
/// - `percentage`, `threshold`: used by `percentage`
/// - `fixed_amount`: used by `fixed`
/// - `configurator_code`, `configurator_link`: optional free text
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VehicleRecord {
    pub name: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub list_price: Decimal,
    pub taxation: String,
    #[serde(default)]
    pub co_payment_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub percentage: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub threshold: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub fixed_amount: Option<Decimal>,
    #[serde(default)]
    pub configurator_code: Option<String>,
    #[serde(default)]
    pub configurator_link: Option<String>,
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.trim().parse::<Decimal>().map_err(serde::de::Error::custom)
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl VehicleRecord {
    /// Converts the record into a validated [`Vehicle`] with a fresh id.
    pub fn to_vehicle(
        &self,
        line: usize,
    ) -> Result<Vehicle, VehicleLoaderError> {
        let taxation = TaxationType::parse(&self.taxation).ok_or_else(|| {
            VehicleLoaderError::InvalidTaxation {
                line,
                value: self.taxation.clone(),
            }
        })?;

        let mut vehicle = Vehicle::new(self.name.trim(), self.list_price, taxation);
        vehicle.co_payment = self.co_payment(line)?;
        vehicle.configurator_code = non_blank(&self.configurator_code);
        vehicle.configurator_link = non_blank(&self.configurator_link);

        vehicle
            .validate()
            .map_err(|source| VehicleLoaderError::InvalidVehicle { line, source })?;
        Ok(vehicle)
    }

    fn co_payment(
        &self,
        line: usize,
    ) -> Result<Option<CoPaymentPolicy>, VehicleLoaderError> {
        let Some(kind) = non_blank(&self.co_payment_type) else {
            return Ok(None);
        };
        let require = |value: Option<Decimal>, field: &'static str| {
            value.ok_or(VehicleLoaderError::MissingField { line, field })
        };

        let policy = match kind.to_lowercase().as_str() {
            "none" => CoPaymentPolicy::None,
            "fixed" => CoPaymentPolicy::Fixed {
                monthly_amount: require(self.fixed_amount, "fixed_amount")?,
            },
            "percentage" => CoPaymentPolicy::Percentage {
                percentage: require(self.percentage, "percentage")?,
                threshold: require(self.threshold, "threshold")?,
            },
            _ => {
                return Err(VehicleLoaderError::InvalidCoPaymentType { line, value: kind });
            }
        };
        Ok(Some(policy))
    }
}

/// Loader for vehicle offers from CSV files.
///
/// Works against any [`ConfigRepository`] backend.
pub struct VehicleLoader;

impl VehicleLoader {
    /// Parse vehicle records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<VehicleRecord>, VehicleLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: VehicleRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Convert every record, failing on the first invalid one.
    pub fn to_vehicles(records: &[VehicleRecord]) -> Result<Vec<Vehicle>, VehicleLoaderError> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| record.to_vehicle(index + 2))
            .collect()
    }

    /// Load vehicle records into the repository.
    ///
    /// All records are validated before anything is written. A record whose
    /// name matches a stored vehicle replaces that vehicle and keeps its id,
    /// so loading the same file twice gives the same result.
    ///
    /// Returns the number of vehicles written.
    pub async fn load<R: ConfigRepository + ?Sized>(
        repo: &R,
        records: &[VehicleRecord],
    ) -> Result<usize, VehicleLoaderError> {
        let vehicles = Self::to_vehicles(records)?;
        let existing = repo.list_vehicles().await?;

        for mut vehicle in vehicles.iter().cloned() {
            if let Some(stored) = existing.iter().find(|v| v.name == vehicle.name) {
                debug!(name = %vehicle.name, id = %stored.id, "replacing stored vehicle");
                vehicle.id = stored.id;
            }
            repo.put_vehicle(&vehicle).await?;
        }

        info!(count = vehicles.len(), "loaded vehicles");
        Ok(vehicles.len())
    }
}
