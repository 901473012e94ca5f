//! dishcache core: an offline-first catalog of food categories and dishes.
//!
//! Data flows from the catalog backend (`api`) into a local JSON record
//! store (`cache`). The screen controllers (`controller`) decide between
//! network and cache using `connectivity`. The category header also shows
//! a city from `location`.

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod controller;
pub mod location;
pub mod models;

pub use api::{ApiClient, CatalogApi, Endpoints, FetchError};
pub use cache::{RecordStore, StoreError};
pub use config::Config;
pub use connectivity::{NetworkMonitor, ProbeConfig};
pub use controller::{
    CatalogDeps, CatalogNavigator, CategoryController, DataError, DishController, LoadState,
};
pub use location::{FixedLocation, LocationError, LocationProvider};
pub use models::{Category, Dish, DishTag, Locale};
