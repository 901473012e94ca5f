//! City lookup for the category screen header.
//!
//! Location is supplementary: it labels the screen, it never gates loading
//! the catalog. Platform location services implement `LocationProvider`;
//! `FixedLocation` serves a configured city.

use std::future::Future;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("No internet access.")]
    NoInternetAccess,

    #[error("Access to geolocation is prohibited.")]
    Denied,

    #[error("Location is not available")]
    Unavailable,
}

pub trait LocationProvider: Send + Sync {
    /// Resolve the current city name.
    fn current_city(&self) -> impl Future<Output = Result<String, LocationError>> + Send;
}

/// Provider answering with a configured city, or `Unavailable` when none is set.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    city: Option<String>,
}

impl FixedLocation {
    pub fn new(city: Option<String>) -> Self {
        Self {
            city: city.filter(|c| !c.trim().is_empty()),
        }
    }
}

impl LocationProvider for FixedLocation {
    async fn current_city(&self) -> Result<String, LocationError> {
        self.city.clone().ok_or(LocationError::Unavailable)
    }
}
