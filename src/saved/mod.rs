//! User-curated saved cities, persisted in SQLite.

pub mod service;
pub mod store;

pub use service::{SavedCityService, SavedCityView};
pub use store::{SavedCity, SavedCityStore, StoreError};
