use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{ConfigRepository, RepositoryError};

/// Where profiles and vehicles are stored.
///
/// `backend` selects a registered [`RepositoryFactory`] by name (compared
/// case-insensitively); `connection_string` means whatever that backend
/// makes of it.
///
/// | backend  | connection_string                    |
/// |----------|--------------------------------------|
/// | `sqlite` | `dienstwagen.db`, `sqlite:…`, `:memory:` |
/// | `memory` | ignored                              |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl DbConfig {
    pub fn new(
        backend: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            connection_string: connection_string.into(),
        }
    }
}

impl Default for DbConfig {
    /// An ephemeral SQLite database.
    fn default() -> Self {
        Self::new("sqlite", ":memory:")
    }
}

/// Opens one kind of storage. Backends register a factory with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase name the backend is selected by.
    fn backend_name(&self) -> &'static str;

    /// Opens the store, creating and migrating it where the backend
    /// supports that.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ConfigRepository>, RepositoryError>;
}

#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A later factory with the same name replaces the earlier one.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens the repository of the backend named in `config`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Configuration`] when no such backend is registered;
    /// otherwise whatever the backend's factory reports.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ConfigRepository>, RepositoryError> {
        let wanted = config.backend.trim().to_lowercase();
        let Some(factory) = self.factories.get(wanted.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        factory.create(config).await
    }
}
