//! Bulk import of company car offers from CSV.

pub mod loader;

pub use loader::{VehicleLoader, VehicleLoaderError, VehicleRecord};
