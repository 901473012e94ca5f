//! API client for the catalog backend.
//!
//! The demo backend is a pair of static mock endpoints. The dishes endpoint
//! returns the same list whatever category is asked for; the category id is
//! still part of the interface and is substituted into the URL when the
//! configured template contains `{category_id}`.

use std::future::Future;

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{CategoriesResponse, CategoryResponse, DishResponse, DishesResponse};

use super::FetchError;

// ============================================================================
// Constants
// ============================================================================

/// Mock endpoint serving the category list
pub const DEFAULT_CATEGORIES_URL: &str =
    "https://run.mocky.io/v3/ac1e983b-0ad7-4d68-8a26-8b845e0b7609";

/// Mock endpoint serving the dish list (ignores the category)
pub const DEFAULT_DISHES_URL: &str =
    "https://run.mocky.io/v3/a013eb83-8059-44d6-a880-893baaa18ad6";

/// Placeholder replaced by the category id in the dishes URL
const CATEGORY_ID_PLACEHOLDER: &str = "{category_id}";

/// Remote source of catalog listings.
pub trait CatalogApi: Send + Sync {
    fn fetch_categories(
        &self,
    ) -> impl Future<Output = Result<Vec<CategoryResponse>, FetchError>> + Send;

    fn fetch_dishes(
        &self,
        category_id: i64,
    ) -> impl Future<Output = Result<Vec<DishResponse>, FetchError>> + Send;
}

/// Endpoint URLs, usually taken from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub categories_url: String,
    /// May contain `{category_id}`
    pub dishes_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            categories_url: DEFAULT_CATEGORIES_URL.to_string(),
            dishes_url: DEFAULT_DISHES_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn dishes_url_for(&self, category_id: i64) -> String {
        self.dishes_url
            .replace(CATEGORY_ID_PLACEHOLDER, &category_id.to_string())
    }
}

/// HTTP implementation of `CatalogApi`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
}

impl ApiClient {
    /// Create a new API client. No timeout is set beyond the client default.
    pub fn new(endpoints: Endpoints) -> Result<Self, FetchError> {
        let client = Client::builder()
            .build()
            .map_err(|e| FetchError::Other(e.to_string()))?;

        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(FetchError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(url = url, "GET");
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let response = Self::check_response(response).await?;

        // Read the body first so shape mismatches surface as decoding errors
        let text = response.text().await.map_err(FetchError::from_transport)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl CatalogApi for ApiClient {
    async fn fetch_categories(&self) -> Result<Vec<CategoryResponse>, FetchError> {
        let parsed: CategoriesResponse = self.get(&self.endpoints.categories_url).await?;
        info!(count = parsed.categories.len(), "Fetched categories");
        Ok(parsed.categories)
    }

    async fn fetch_dishes(&self, category_id: i64) -> Result<Vec<DishResponse>, FetchError> {
        let url = self.endpoints.dishes_url_for(category_id);
        let parsed: DishesResponse = self.get(&url).await?;
        info!(category_id, count = parsed.dishes.len(), "Fetched dishes");
        Ok(parsed.dishes)
    }
}
