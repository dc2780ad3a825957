use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{UserProfile, Vehicle};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Everything a repository stores, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub profiles: Vec<UserProfile>,
    pub active_profile_id: Option<Uuid>,
    pub vehicles: Vec<Vehicle>,
}

impl ConfigSnapshot {
    pub fn active_profile(&self) -> Option<&UserProfile> {
        let id = self.active_profile_id?;
        self.profiles.iter().find(|p| p.id == id)
    }
}

/// Storage for profiles, the active profile selection and vehicles.
///
/// Listing methods return records in insertion order; replacing a record
/// with [`put_profile`](Self::put_profile) or [`put_vehicle`](Self::put_vehicle)
/// keeps its position.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    // Profiles
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, RepositoryError>;
    async fn get_profile(&self, id: Uuid) -> Result<UserProfile, RepositoryError>;
    async fn put_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError>;
    async fn delete_profile(&self, id: Uuid) -> Result<(), RepositoryError>;

    // Active profile
    async fn get_active_profile_id(&self) -> Result<Option<Uuid>, RepositoryError>;
    async fn set_active_profile_id(&self, id: Option<Uuid>) -> Result<(), RepositoryError>;

    // Vehicles
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError>;
    async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, RepositoryError>;
    async fn put_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError>;
    async fn delete_vehicle(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Replaces the whole store. Either every record is replaced or none is.
    async fn replace_all(&self, snapshot: &ConfigSnapshot) -> Result<(), RepositoryError>;

    async fn snapshot(&self) -> Result<ConfigSnapshot, RepositoryError> {
        Ok(ConfigSnapshot {
            profiles: self.list_profiles().await?,
            active_profile_id: self.get_active_profile_id().await?,
            vehicles: self.list_vehicles().await?,
        })
    }
}
