//! In-process [`ConfigRepository`] backed by a lock-guarded snapshot.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{ConfigRepository, ConfigSnapshot, RepositoryError};
use crate::models::{UserProfile, Vehicle};

/// Keeps everything in memory; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<ConfigSnapshot>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: ConfigSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ConfigSnapshot>, RepositoryError> {
        self.state
            .read()
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ConfigSnapshot>, RepositoryError> {
        self.state
            .write()
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }
}

#[async_trait]
impl ConfigRepository for MemoryRepository {
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        Ok(self.read()?.profiles.clone())
    }

    async fn get_profile(&self, id: Uuid) -> Result<UserProfile, RepositoryError> {
        self.read()?
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        match state.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => state.profiles.push(profile.clone()),
        }
        Ok(())
    }

    async fn delete_profile(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        let before = state.profiles.len();
        state.profiles.retain(|p| p.id != id);
        if state.profiles.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_active_profile_id(&self) -> Result<Option<Uuid>, RepositoryError> {
        Ok(self.read()?.active_profile_id)
    }

    async fn set_active_profile_id(&self, id: Option<Uuid>) -> Result<(), RepositoryError> {
        self.write()?.active_profile_id = id;
        Ok(())
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        Ok(self.read()?.vehicles.clone())
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, RepositoryError> {
        self.read()?
            .vehicles
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn put_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        match state.vehicles.iter_mut().find(|v| v.id == vehicle.id) {
            Some(existing) => *existing = vehicle.clone(),
            None => state.vehicles.push(vehicle.clone()),
        }
        Ok(())
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        let before = state.vehicles.len();
        state.vehicles.retain(|v| v.id != id);
        if state.vehicles.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn replace_all(&self, snapshot: &ConfigSnapshot) -> Result<(), RepositoryError> {
        *self.write()? = snapshot.clone();
        Ok(())
    }

    async fn snapshot(&self) -> Result<ConfigSnapshot, RepositoryError> {
        Ok(self.read()?.clone())
    }
}

/// Registers the in-memory backend under `"memory"`. The connection string
/// is ignored.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn ConfigRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::new()))
    }
}
