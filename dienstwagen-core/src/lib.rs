pub mod calculations;
pub mod codec;
pub mod db;
pub mod models;
pub mod service;

pub use calculations::CalculationError;
pub use db::repository::{ConfigRepository, ConfigSnapshot, RepositoryError};
pub use models::*;
pub use service::{ProfileService, ServiceError};
