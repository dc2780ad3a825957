use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dienstwagen_core::{
    ConfigRepository, ConfigSnapshot, RepositoryError, UserData, UserProfile, Vehicle,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;
use uuid::Uuid;

const ACTIVE_PROFILE_KEY: &str = "active_profile_id";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens the database named by `connection_string`.
    ///
    /// * `":memory:"` opens a private in-memory database on a single
    ///   connection that is never recycled.
    /// * A `sqlite:` URL is used as is.
    /// * Anything else is a file path; the file is created if missing.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let in_memory = matches!(connection_string, ":memory:" | "sqlite::memory:");
        let url = if in_memory {
            "sqlite::memory:".to_string()
        } else if connection_string.starts_with("sqlite:") {
            connection_string.to_string()
        } else {
            format!("sqlite:{connection_string}")
        };

        let options = SqliteConnectOptions::from_str(&url)
            .with_context(|| format!("Invalid database url: {url}"))?
            .create_if_missing(true);

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {url}"))?;

        debug!(url = %url, "opened sqlite database");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn database_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn parse_id(text: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(text).map_err(|e| RepositoryError::Database(format!("Invalid id '{text}': {e}")))
}

fn row_to_profile(row: &SqliteRow) -> Result<UserProfile, RepositoryError> {
    let id: String = row.try_get("id").map_err(database_error)?;
    let user_data: String = row.try_get("user_data").map_err(database_error)?;

    Ok(UserProfile {
        id: parse_id(&id)?,
        name: row.try_get("name").map_err(database_error)?,
        user_data: serde_json::from_str::<UserData>(&user_data).map_err(|e| {
            RepositoryError::Database(format!("Failed to decode user data of profile {id}: {e}"))
        })?,
    })
}

fn row_to_vehicle(row: &SqliteRow) -> Result<Vehicle, RepositoryError> {
    let data: String = row.try_get("data").map_err(database_error)?;
    serde_json::from_str(&data)
        .map_err(|e| RepositoryError::Database(format!("Failed to decode vehicle: {e}")))
}

async fn insert_profile(
    tx: &mut Transaction<'_, Sqlite>,
    profile: &UserProfile,
) -> Result<(), RepositoryError> {
    let user_data = serde_json::to_string(&profile.user_data).map_err(database_error)?;
    sqlx::query(
        "INSERT INTO profiles (id, position, name, user_data)
         VALUES (?, (SELECT COALESCE(MAX(position), -1) + 1 FROM profiles), ?, ?)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, user_data = excluded.user_data",
    )
    .bind(profile.id.to_string())
    .bind(&profile.name)
    .bind(user_data)
    .execute(&mut **tx)
    .await
    .map_err(database_error)?;
    Ok(())
}

async fn insert_vehicle(
    tx: &mut Transaction<'_, Sqlite>,
    vehicle: &Vehicle,
) -> Result<(), RepositoryError> {
    let data = serde_json::to_string(vehicle).map_err(database_error)?;
    sqlx::query(
        "INSERT INTO vehicles (id, position, name, data)
         VALUES (?, (SELECT COALESCE(MAX(position), -1) + 1 FROM vehicles), ?, ?)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, data = excluded.data",
    )
    .bind(vehicle.id.to_string())
    .bind(&vehicle.name)
    .bind(data)
    .execute(&mut **tx)
    .await
    .map_err(database_error)?;
    Ok(())
}

async fn write_active_profile_id(
    tx: &mut Transaction<'_, Sqlite>,
    id: Option<Uuid>,
) -> Result<(), RepositoryError> {
    match id {
        Some(id) => {
            sqlx::query(
                "INSERT INTO settings (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(ACTIVE_PROFILE_KEY)
            .bind(id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(database_error)?;
        }
        None => {
            sqlx::query("DELETE FROM settings WHERE key = ?")
                .bind(ACTIVE_PROFILE_KEY)
                .execute(&mut **tx)
                .await
                .map_err(database_error)?;
        }
    }
    Ok(())
}

#[async_trait]
impl ConfigRepository for SqliteRepository {
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, user_data FROM profiles ORDER BY position")
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        rows.iter().map(row_to_profile).collect()
    }

    async fn get_profile(&self, id: Uuid) -> Result<UserProfile, RepositoryError> {
        let row = sqlx::query("SELECT id, name, user_data FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_profile(&row)
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;
        insert_profile(&mut tx, profile).await?;
        tx.commit().await.map_err(database_error)
    }

    async fn delete_profile(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_active_profile_id(&self) -> Result<Option<Uuid>, RepositoryError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(ACTIVE_PROFILE_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        value.as_deref().map(parse_id).transpose()
    }

    async fn set_active_profile_id(&self, id: Option<Uuid>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;
        write_active_profile_id(&mut tx, id).await?;
        tx.commit().await.map_err(database_error)
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        let rows = sqlx::query("SELECT data FROM vehicles ORDER BY position")
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        rows.iter().map(row_to_vehicle).collect()
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, RepositoryError> {
        let row = sqlx::query("SELECT data FROM vehicles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_vehicle(&row)
    }

    async fn put_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;
        insert_vehicle(&mut tx, vehicle).await?;
        tx.commit().await.map_err(database_error)
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn replace_all(&self, snapshot: &ConfigSnapshot) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        for table in ["profiles", "vehicles", "settings"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await
                .map_err(database_error)?;
        }
        for profile in &snapshot.profiles {
            insert_profile(&mut tx, profile).await?;
        }
        for vehicle in &snapshot.vehicles {
            insert_vehicle(&mut tx, vehicle).await?;
        }
        write_active_profile_id(&mut tx, snapshot.active_profile_id).await?;

        // Dropping the transaction on an early return rolls it back.
        tx.commit().await.map_err(database_error)?;

        debug!(
            profiles = snapshot.profiles.len(),
            vehicles = snapshot.vehicles.len(),
            "replaced stored configuration"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dienstwagen_core::{CoPaymentPolicy, FederalState, TaxClass, TaxationType};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let repo = SqliteRepository::new_with_pool(pool).await;
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    fn family_profile() -> UserProfile {
        UserProfile::new(
            "Familie",
            UserData {
                gross_monthly_salary: dec!(6150.75),
                tax_class: TaxClass::III,
                state: FederalState::BadenWuerttemberg,
                child_allowances: dec!(1.5),
                church_tax_liable: true,
                ..UserData::default()
            },
        )
    }

    #[tokio::test]
    async fn test_put_and_get_profile() {
        let repo = setup_test_db().await;
        let profile = family_profile();

        repo.put_profile(&profile).await.unwrap();

        let stored = repo.get_profile(profile.id).await.unwrap();
        assert_eq!(stored, profile);
        assert_eq!(stored.user_data.gross_monthly_salary.to_string(), "6150.75");
    }

    #[tokio::test]
    async fn test_get_profile_not_found() {
        let repo = setup_test_db().await;

        let result = repo.get_profile(Uuid::new_v4()).await;
        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_list_profiles_keeps_insertion_order_on_update() {
        let repo = setup_test_db().await;
        let mut first = UserProfile::new("Eins", UserData::default());
        let second = UserProfile::new("Zwei", UserData::default());
        let third = UserProfile::new("Drei", UserData::default());

        repo.put_profile(&first).await.unwrap();
        repo.put_profile(&second).await.unwrap();
        repo.put_profile(&third).await.unwrap();
        first.name = "Eins (geändert)".to_string();
        repo.put_profile(&first).await.unwrap();

        let names: Vec<_> = repo
            .list_profiles()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Eins (geändert)", "Zwei", "Drei"]);
    }

    #[tokio::test]
    async fn test_delete_profile() {
        let repo = setup_test_db().await;
        let profile = family_profile();
        repo.put_profile(&profile).await.unwrap();

        repo.delete_profile(profile.id).await.unwrap();

        assert!(repo.list_profiles().await.unwrap().is_empty());
        assert_eq!(
            repo.delete_profile(profile.id).await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_active_profile_id() {
        let repo = setup_test_db().await;
        let id = Uuid::new_v4();

        assert_eq!(repo.get_active_profile_id().await.unwrap(), None);

        repo.set_active_profile_id(Some(id)).await.unwrap();
        assert_eq!(repo.get_active_profile_id().await.unwrap(), Some(id));

        let other = Uuid::new_v4();
        repo.set_active_profile_id(Some(other)).await.unwrap();
        assert_eq!(repo.get_active_profile_id().await.unwrap(), Some(other));

        repo.set_active_profile_id(None).await.unwrap();
        assert_eq!(repo.get_active_profile_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_vehicle_crud() {
        let repo = setup_test_db().await;
        let mut car = Vehicle::new("Kombi", dec!(60000), TaxationType::Full).with_co_payment(
            CoPaymentPolicy::Fixed {
                monthly_amount: dec!(150),
            },
        );
        car.configurator_code = Some("K-42".to_string());

        repo.put_vehicle(&car).await.unwrap();
        assert_eq!(repo.get_vehicle(car.id).await.unwrap(), car);

        car.list_price = dec!(61500.50);
        repo.put_vehicle(&car).await.unwrap();
        assert_eq!(repo.list_vehicles().await.unwrap(), vec![car.clone()]);

        repo.delete_vehicle(car.id).await.unwrap();
        assert_eq!(
            repo.get_vehicle(car.id).await,
            Err(RepositoryError::NotFound)
        );
        assert_eq!(
            repo.delete_vehicle(car.id).await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_replace_all_and_snapshot() {
        let repo = setup_test_db().await;
        repo.put_profile(&UserProfile::standard()).await.unwrap();
        repo.put_vehicle(&Vehicle::new("Alt", dec!(30000), TaxationType::Hybrid))
            .await
            .unwrap();

        let profile = family_profile();
        let snapshot = ConfigSnapshot {
            profiles: vec![profile.clone(), UserProfile::new("Zweit", UserData::default())],
            active_profile_id: Some(profile.id),
            vehicles: vec![
                Vehicle::new("BEV", dec!(48000), TaxationType::Electric),
                Vehicle::new("PHEV", dec!(52000), TaxationType::Hybrid),
            ],
        };
        repo.replace_all(&snapshot).await.unwrap();

        assert_eq!(repo.snapshot().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_replace_all_with_empty_snapshot_clears_active_id() {
        let repo = setup_test_db().await;
        let profile = family_profile();
        repo.put_profile(&profile).await.unwrap();
        repo.set_active_profile_id(Some(profile.id)).await.unwrap();

        repo.replace_all(&ConfigSnapshot::default()).await.unwrap();

        assert_eq!(repo.snapshot().await.unwrap(), ConfigSnapshot::default());
    }

    #[tokio::test]
    async fn test_new_with_memory_connection_string() {
        let repo = SqliteRepository::new(":memory:").await.unwrap();
        repo.run_migrations().await.unwrap();

        let profile = family_profile();
        repo.put_profile(&profile).await.unwrap();

        assert_eq!(repo.list_profiles().await.unwrap(), vec![profile]);
    }

    #[tokio::test]
    async fn test_file_database_persists_across_connections() {
        let path = std::env::temp_dir().join(format!("dienstwagen-{}.db", Uuid::new_v4()));
        let path_str = path.to_string_lossy().to_string();
        let profile = family_profile();

        {
            let repo = SqliteRepository::new(&path_str).await.unwrap();
            repo.run_migrations().await.unwrap();
            repo.put_profile(&profile).await.unwrap();
            repo.set_active_profile_id(Some(profile.id)).await.unwrap();
            repo.pool().close().await;
        }

        let repo = SqliteRepository::new(&path_str).await.unwrap();
        repo.run_migrations().await.unwrap();
        assert_eq!(repo.get_active_profile_id().await.unwrap(), Some(profile.id));
        assert_eq!(repo.get_profile(profile.id).await.unwrap(), profile);

        repo.pool().close().await;
        let _ = std::fs::remove_file(&path);
    }
}
