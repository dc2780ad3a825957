use async_trait::async_trait;

use dienstwagen_core::db::{ConfigRepository, DbConfig, RepositoryError, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Opens [`SqliteRepository`] stores for the `"sqlite"` backend.
///
/// ```rust,no_run
/// use dienstwagen_core::db::RepositoryRegistry;
/// use dienstwagen_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// `config.connection_string` is a file path (created when missing), a
    /// `sqlite:` URL or `:memory:`. The schema is migrated before returning.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ConfigRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}
