//! SQLite storage for profiles, the active profile selection and vehicles.

mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
