//! JSON export and import of the whole configuration.
//!
//! ```json
//! {
//!   "profiles": [ ... ],
//!   "activeProfileId": "3f0c...",
//!   "vehicles": [ ... ],
//!   "exportDate": "2025-03-01T12:00:00Z",
//!   "formatVersion": "1.0"
//! }
//! ```
//!
//! Import validates the complete document before returning anything, so a
//! caller that only writes on `Ok` never stores a partial import.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calculations::CalculationError;
use crate::db::ConfigSnapshot;
use crate::models::{UserProfile, Vehicle};

pub const FORMAT_VERSION: &str = "1.0";

const SUPPORTED_MAJOR: &str = "1";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("document is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("document has no '{0}' collection")]
    MissingCollection(&'static str),

    #[error("'{0}' is not a list")]
    NotACollection(&'static str),

    #[error("unsupported format version '{0}'")]
    UnsupportedVersion(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("profile {id} is invalid: {source}")]
    InvalidProfile {
        id: Uuid,
        source: CalculationError,
    },

    #[error("vehicle {id} is invalid: {source}")]
    InvalidVehicle {
        id: Uuid,
        source: CalculationError,
    },

    #[error("id {0} appears more than once")]
    DuplicateId(Uuid),
}

/// The exported file's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub profiles: Vec<UserProfile>,
    pub active_profile_id: Option<Uuid>,
    pub vehicles: Vec<Vehicle>,
    pub export_date: DateTime<Utc>,
    pub format_version: String,
}

pub fn export(
    snapshot: &ConfigSnapshot,
    now: DateTime<Utc>,
) -> ExportDocument {
    ExportDocument {
        profiles: snapshot.profiles.clone(),
        active_profile_id: snapshot.active_profile_id,
        vehicles: snapshot.vehicles.clone(),
        export_date: now,
        format_version: FORMAT_VERSION.to_string(),
    }
}

/// Pretty-printed JSON of `document`.
pub fn to_json(document: &ExportDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}

/// Suggested file name for an export taken at `now`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("dienstwagen-config-{}.json", now.format("%Y-%m-%d"))
}

/// Parses and validates an exported document.
///
/// A missing or dangling `activeProfileId` selects the first profile. A
/// missing `formatVersion` is read as the current version and a missing
/// `vehicles` collection as empty; `profiles` is required.
///
/// # Errors
///
/// Returns [`ImportError`] on the first problem found; nothing is returned
/// for partially valid documents.
pub fn import(json: &str) -> Result<ConfigSnapshot, ImportError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(root) = value else {
        return Err(ImportError::NotAnObject);
    };

    check_version(&root)?;

    let profiles: Vec<UserProfile> = records(&root, "profiles")?
        .ok_or(ImportError::MissingCollection("profiles"))?;
    let vehicles: Vec<Vehicle> = records(&root, "vehicles")?.unwrap_or_default();

    let mut seen = HashSet::new();
    for profile in &profiles {
        if !seen.insert(profile.id) {
            return Err(ImportError::DuplicateId(profile.id));
        }
        profile
            .user_data
            .validate()
            .map_err(|source| ImportError::InvalidProfile {
                id: profile.id,
                source,
            })?;
    }
    for vehicle in &vehicles {
        if !seen.insert(vehicle.id) {
            return Err(ImportError::DuplicateId(vehicle.id));
        }
        vehicle
            .validate()
            .map_err(|source| ImportError::InvalidVehicle {
                id: vehicle.id,
                source,
            })?;
    }

    let requested = root
        .get("activeProfileId")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok());
    let active_profile_id = match requested {
        Some(id) if profiles.iter().any(|p| p.id == id) => Some(id),
        _ => {
            let fallback = profiles.first().map(|p| p.id);
            if requested.is_some() {
                warn!(?requested, ?fallback, "active profile not in document; using first profile");
            }
            fallback
        }
    };

    debug!(
        profiles = profiles.len(),
        vehicles = vehicles.len(),
        "parsed import document"
    );

    Ok(ConfigSnapshot {
        profiles,
        active_profile_id,
        vehicles,
    })
}

fn check_version(root: &Map<String, Value>) -> Result<(), ImportError> {
    let version = match root.get("formatVersion") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::String(s)) => s.as_str(),
        Some(other) => return Err(ImportError::UnsupportedVersion(other.to_string())),
    };

    let major = version.split('.').next().unwrap_or_default();
    if major != SUPPORTED_MAJOR {
        return Err(ImportError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}

/// `None` when `key` is absent or null.
fn records<T: for<'de> Deserialize<'de>>(
    root: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<Vec<T>>, ImportError> {
    let items = match root.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ImportError::NotACollection(key)),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            T::deserialize(item)
                .map_err(|e| ImportError::InvalidRecord(format!("{key}[{index}]: {e}")))
        })
        .collect::<Result<_, _>>()
        .map(Some)
}
