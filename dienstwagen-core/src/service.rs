//! Profile and vehicle management on top of a [`ConfigRepository`].
//!
//! After every successful operation the store holds at least one profile
//! and the active profile id points at one of them.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::calculations::{
    CalculationError, NetIncomeBreakdown, NetIncomeComparator, VehicleComparison,
};
use crate::codec::{self, ExportDocument, ImportError};
use crate::db::{ConfigRepository, ConfigSnapshot, RepositoryError};
use crate::models::{ProfileUpdate, TaxParameters, UserData, UserProfile, Vehicle};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("profile name must not be empty")]
    EmptyProfileName,
}

pub struct ProfileService<'a> {
    repo: &'a dyn ConfigRepository,
    params: &'a TaxParameters,
}

impl<'a> ProfileService<'a> {
    pub fn new(repo: &'a dyn ConfigRepository, params: &'a TaxParameters) -> Self {
        Self { repo, params }
    }

    /// Creates the default profile in an empty store and repairs a missing
    /// or dangling active id. Returns the active profile.
    pub async fn initialize(&self) -> Result<UserProfile, ServiceError> {
        let profiles = self.repo.list_profiles().await?;

        let Some(first) = profiles.first() else {
            let profile = UserProfile::standard();
            self.repo.put_profile(&profile).await?;
            self.repo.set_active_profile_id(Some(profile.id)).await?;
            info!(profile = %profile.id, "created default profile");
            return Ok(profile);
        };

        let active_id = self.repo.get_active_profile_id().await?;
        if let Some(active) = active_id.and_then(|id| profiles.iter().find(|p| p.id == id)) {
            return Ok(active.clone());
        }

        self.repo.set_active_profile_id(Some(first.id)).await?;
        info!(profile = %first.id, "active profile missing; selected first profile");
        Ok(first.clone())
    }

    pub async fn active_profile(&self) -> Result<UserProfile, ServiceError> {
        if let Some(id) = self.repo.get_active_profile_id().await? {
            match self.repo.get_profile(id).await {
                Ok(profile) => return Ok(profile),
                Err(RepositoryError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.initialize().await
    }

    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, ServiceError> {
        self.initialize().await?;
        Ok(self.repo.list_profiles().await?)
    }

    /// Adds a profile and makes it active. Without `data` the defaults apply.
    pub async fn add_profile(
        &self,
        name: &str,
        data: Option<UserData>,
    ) -> Result<UserProfile, ServiceError> {
        let name = non_empty(name)?;
        let data = data.unwrap_or_default();
        data.validate()?;

        let profile = UserProfile::new(name, data);
        self.repo.put_profile(&profile).await?;
        self.repo.set_active_profile_id(Some(profile.id)).await?;

        info!(profile = %profile.id, name = %profile.name, "added profile");
        Ok(profile)
    }

    pub async fn rename_profile(
        &self,
        id: Uuid,
        name: &str,
    ) -> Result<UserProfile, ServiceError> {
        let name = non_empty(name)?;
        let mut profile = self.repo.get_profile(id).await?;
        profile.name = name.to_string();
        self.repo.put_profile(&profile).await?;
        Ok(profile)
    }

    /// Deletes a profile. Deleting the active profile selects the first
    /// remaining one, or a new default profile when none remain.
    pub async fn delete_profile(&self, id: Uuid) -> Result<(), ServiceError> {
        self.repo.delete_profile(id).await?;
        info!(profile = %id, "deleted profile");

        if self.repo.get_active_profile_id().await? == Some(id) {
            self.repo.set_active_profile_id(None).await?;
        }
        self.initialize().await?;
        Ok(())
    }

    /// Returns `false` and changes nothing when `id` is unknown.
    pub async fn set_active_profile(&self, id: Uuid) -> Result<bool, ServiceError> {
        match self.repo.get_profile(id).await {
            Ok(_) => {
                self.repo.set_active_profile_id(Some(id)).await?;
                Ok(true)
            }
            Err(RepositoryError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies `update` to the active profile's data.
    pub async fn update_user_data(
        &self,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ServiceError> {
        let mut profile = self.active_profile().await?;
        if update.is_empty() {
            return Ok(profile);
        }

        let data = update.apply(&profile.user_data);
        data.validate()?;
        profile.user_data = data;
        self.repo.put_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, ServiceError> {
        Ok(self.repo.list_vehicles().await?)
    }

    /// Stores `vehicle` under a fresh id and returns the stored record.
    pub async fn add_vehicle(
        &self,
        vehicle: Vehicle,
    ) -> Result<Vehicle, ServiceError> {
        vehicle.validate()?;
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            ..vehicle
        };
        self.repo.put_vehicle(&vehicle).await?;
        info!(vehicle = %vehicle.id, name = %vehicle.name, "added vehicle");
        Ok(vehicle)
    }

    /// Returns `false` and changes nothing when the vehicle is unknown.
    pub async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<bool, ServiceError> {
        vehicle.validate()?;
        match self.repo.get_vehicle(vehicle.id).await {
            Ok(_) => {
                self.repo.put_vehicle(vehicle).await?;
                Ok(true)
            }
            Err(RepositoryError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `false` when the vehicle is unknown.
    pub async fn remove_vehicle(&self, id: Uuid) -> Result<bool, ServiceError> {
        match self.repo.delete_vehicle(id).await {
            Ok(()) => {
                info!(vehicle = %id, "removed vehicle");
                Ok(true)
            }
            Err(RepositoryError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Net income of the active profile without a company car.
    pub async fn net_income(&self) -> Result<NetIncomeBreakdown, ServiceError> {
        let profile = self.active_profile().await?;
        Ok(NetIncomeComparator::new(self.params).net_income(&profile.user_data)?)
    }

    /// Compares every stored vehicle for the active profile.
    pub async fn compare_active(&self) -> Result<Vec<VehicleComparison>, ServiceError> {
        let profile = self.active_profile().await?;
        let vehicles = self.repo.list_vehicles().await?;
        Ok(NetIncomeComparator::new(self.params).compare_all(&profile.user_data, &vehicles))
    }

    pub async fn export_document(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ExportDocument, ServiceError> {
        self.initialize().await?;
        let snapshot = self.repo.snapshot().await?;
        Ok(codec::export(&snapshot, now))
    }

    /// Replaces the whole store with the contents of `json`.
    ///
    /// Nothing is written unless the document is valid. A document without
    /// profiles gets the default profile.
    pub async fn import_document(&self, json: &str) -> Result<ConfigSnapshot, ServiceError> {
        let mut snapshot = codec::import(json)?;

        if snapshot.profiles.is_empty() {
            let profile = UserProfile::standard();
            snapshot.active_profile_id = Some(profile.id);
            snapshot.profiles.push(profile);
        }

        self.repo.replace_all(&snapshot).await?;
        info!(
            profiles = snapshot.profiles.len(),
            vehicles = snapshot.vehicles.len(),
            "imported configuration"
        );
        Ok(snapshot)
    }
}

fn non_empty(name: &str) -> Result<&str, ServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::EmptyProfileName);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::db::MemoryRepository;
    use crate::models::{DEFAULT_PROFILE_NAME, TaxClass, TaxationType};

    fn params() -> TaxParameters {
        TaxParameters::year_2025()
    }

    #[tokio::test]
    async fn initialize_creates_default_profile() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);

        let active = service.initialize().await.unwrap();

        assert_eq!(active.name, DEFAULT_PROFILE_NAME);
        assert_eq!(repo.get_active_profile_id().await.unwrap(), Some(active.id));
        assert_eq!(repo.list_profiles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn initialize_repairs_dangling_active_id() {
        let first = UserProfile::new("Eins", UserData::default());
        let repo = MemoryRepository::with_snapshot(ConfigSnapshot {
            profiles: vec![first.clone(), UserProfile::new("Zwei", UserData::default())],
            active_profile_id: Some(Uuid::new_v4()),
            vehicles: Vec::new(),
        });
        let params = params();
        let service = ProfileService::new(&repo, &params);

        assert_eq!(service.active_profile().await.unwrap(), first);
        assert_eq!(repo.get_active_profile_id().await.unwrap(), Some(first.id));
    }

    #[tokio::test]
    async fn add_profile_becomes_active() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        service.initialize().await.unwrap();

        let added = service.add_profile("  Zweitjob ", None).await.unwrap();

        assert_eq!(added.name, "Zweitjob");
        assert_eq!(service.active_profile().await.unwrap(), added);
        assert_eq!(service.list_profiles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn add_profile_rejects_empty_name_and_invalid_data() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);

        assert!(matches!(
            service.add_profile("   ", None).await,
            Err(ServiceError::EmptyProfileName)
        ));

        let data = UserData {
            pension_rate: dec!(-1),
            ..UserData::default()
        };
        assert!(matches!(
            service.add_profile("Kaputt", Some(data)).await,
            Err(ServiceError::Calculation(CalculationError::InvalidRate { .. }))
        ));
        assert!(repo.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rename_profile_keeps_data() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        let profile = service.initialize().await.unwrap();

        let renamed = service.rename_profile(profile.id, "Haupt").await.unwrap();

        assert_eq!(renamed.name, "Haupt");
        assert_eq!(renamed.user_data, profile.user_data);
        assert!(matches!(
            service.rename_profile(Uuid::new_v4(), "X").await,
            Err(ServiceError::Repository(RepositoryError::NotFound))
        ));
    }

    #[tokio::test]
    async fn deleting_active_profile_selects_first_remaining() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        let first = service.initialize().await.unwrap();
        let second = service.add_profile("Zwei", None).await.unwrap();

        service.delete_profile(second.id).await.unwrap();

        assert_eq!(service.active_profile().await.unwrap(), first);
    }

    #[tokio::test]
    async fn deleting_inactive_profile_keeps_active() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        let first = service.initialize().await.unwrap();
        let second = service.add_profile("Zwei", None).await.unwrap();

        service.delete_profile(first.id).await.unwrap();

        assert_eq!(service.active_profile().await.unwrap(), second);
    }

    #[tokio::test]
    async fn deleting_last_profile_creates_default() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        let only = service.initialize().await.unwrap();

        service.delete_profile(only.id).await.unwrap();

        let profiles = repo.list_profiles().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_ne!(profiles[0].id, only.id);
        assert_eq!(profiles[0].name, DEFAULT_PROFILE_NAME);
        assert_eq!(
            repo.get_active_profile_id().await.unwrap(),
            Some(profiles[0].id)
        );
    }

    #[tokio::test]
    async fn set_active_profile_ignores_unknown_id() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        let first = service.initialize().await.unwrap();
        service.add_profile("Zwei", None).await.unwrap();

        assert!(!service.set_active_profile(Uuid::new_v4()).await.unwrap());
        assert!(service.set_active_profile(first.id).await.unwrap());
        assert_eq!(service.active_profile().await.unwrap().id, first.id);
    }

    #[tokio::test]
    async fn update_user_data_changes_only_given_fields() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        service.initialize().await.unwrap();

        let update = ProfileUpdate {
            gross_monthly_salary: Some(dec!(5000)),
            tax_class: Some(TaxClass::III),
            ..ProfileUpdate::default()
        };
        let profile = service.update_user_data(&update).await.unwrap();

        assert_eq!(profile.user_data.gross_monthly_salary, dec!(5000));
        assert_eq!(profile.user_data.tax_class, TaxClass::III);
        assert_eq!(profile.user_data.pension_rate, dec!(18.6));
        assert_eq!(service.active_profile().await.unwrap(), profile);
    }

    #[tokio::test]
    async fn update_user_data_rejects_invalid_result() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        let before = service.initialize().await.unwrap();

        let update = ProfileUpdate {
            gross_monthly_salary: Some(dec!(-1)),
            ..ProfileUpdate::default()
        };

        assert!(service.update_user_data(&update).await.is_err());
        assert_eq!(service.active_profile().await.unwrap(), before);
    }

    #[tokio::test]
    async fn vehicle_lifecycle() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        let draft = Vehicle::new("Kombi", dec!(60000), TaxationType::Full);

        let mut stored = service.add_vehicle(draft.clone()).await.unwrap();
        assert_ne!(stored.id, draft.id);

        stored.list_price = dec!(62000);
        assert!(service.update_vehicle(&stored).await.unwrap());
        assert!(!service.update_vehicle(&draft).await.unwrap());
        assert_eq!(service.list_vehicles().await.unwrap(), vec![stored.clone()]);

        assert!(service.remove_vehicle(stored.id).await.unwrap());
        assert!(!service.remove_vehicle(stored.id).await.unwrap());
        assert!(service.list_vehicles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn compare_active_uses_active_profile() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        service
            .add_profile(
                "Referenz",
                Some(UserData {
                    gross_monthly_salary: dec!(5000),
                    ..UserData::default()
                }),
            )
            .await
            .unwrap();
        service
            .add_vehicle(Vehicle::new("Kombi", dec!(60000), TaxationType::Full))
            .await
            .unwrap();

        let results = service.compare_active().await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].result.as_ref().unwrap().net_delta, dec!(-327.12));
        assert_eq!(service.net_income().await.unwrap().net, dec!(2751.25));
    }

    #[tokio::test]
    async fn export_import_round_trip_through_service() {
        let source = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&source, &params);
        service.add_profile("Eins", None).await.unwrap();
        service
            .add_vehicle(Vehicle::new("BEV", dec!(45000), TaxationType::Electric))
            .await
            .unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 30, 8, 0, 0).unwrap();
        let json = codec::to_json(&service.export_document(now).await.unwrap()).unwrap();

        let target = MemoryRepository::new();
        ProfileService::new(&target, &params)
            .import_document(&json)
            .await
            .unwrap();

        assert_eq!(target.snapshot().await.unwrap(), source.snapshot().await.unwrap());
    }

    #[tokio::test]
    async fn failed_import_leaves_store_untouched() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);
        service.initialize().await.unwrap();
        let before = repo.snapshot().await.unwrap();

        let result = service.import_document(r#"{"vehicles": []}"#).await;

        assert!(matches!(
            result,
            Err(ServiceError::Import(ImportError::MissingCollection("profiles")))
        ));
        assert_eq!(repo.snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn import_without_profiles_gets_default_profile() {
        let repo = MemoryRepository::new();
        let params = params();
        let service = ProfileService::new(&repo, &params);

        let snapshot = service
            .import_document(r#"{"profiles": [], "vehicles": []}"#)
            .await
            .unwrap();

        assert_eq!(snapshot.profiles.len(), 1);
        assert_eq!(snapshot.profiles[0].name, DEFAULT_PROFILE_NAME);
        assert_eq!(snapshot.active_profile_id, Some(snapshot.profiles[0].id));
    }
}
