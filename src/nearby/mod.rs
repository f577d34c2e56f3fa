//! Nearby-city resolution.
//!
//! Finds the cities closest to a point using a geocoding provider, ranks them
//! by great-circle distance and optionally keeps only those in a given
//! administrative region (confirmed through weather lookups).

pub mod geocoding;
pub mod resolver;
pub mod types;

pub use geocoding::{GeocodingClient, OpenWeatherClient};
pub use resolver::{NearbyCitiesResolver, ResolveSettings};
pub use types::{CandidateCity, NearbyCities, NearbyError, ResolvedCity};
