//! Category screen controller.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{load_or_fallback, offline_notice, CatalogDeps, CatalogNavigator, DataError, LoadState};
use crate::api::CatalogApi;
use crate::cache::RecordStore;
use crate::connectivity::NetworkMonitor;
use crate::location::{LocationError, LocationProvider};
use crate::models::Category;

/// Buffer size for location results. One lookup per session, with headroom.
const LOCATION_CHANNEL_SIZE: usize = 4;

/// Backs the category list screen.
///
/// Besides the list it carries two labels for the header: the city from the
/// location lookup and, when the list came from cache, an offline notice.
/// They are kept apart so an offline catalog never replaces the city name.
pub struct CategoryController<A> {
    api: Arc<A>,
    store: Arc<RecordStore>,
    monitor: Arc<NetworkMonitor>,
    navigator: Arc<dyn CatalogNavigator>,

    categories: Vec<Category>,
    state: LoadState,
    network_notice: Option<String>,

    city: Option<String>,
    location_error: Option<LocationError>,
    location_rx: mpsc::Receiver<Result<String, LocationError>>,
    location_task: Option<JoinHandle<()>>,
}

impl<A: CatalogApi> CategoryController<A> {
    /// Wire dependencies, start the location lookup and connectivity
    /// monitoring, then run the first load.
    ///
    /// A failed first load is not returned; it is recorded in `state()`.
    pub async fn configure<L>(deps: CatalogDeps<A>, location: L) -> Self
    where
        L: LocationProvider + 'static,
    {
        let (tx, rx) = mpsc::channel(LOCATION_CHANNEL_SIZE);
        let location_task = tokio::spawn(async move {
            let result = location.current_city().await;
            if let Err(e) = tx.send(result).await {
                debug!(error = %e, "Location result dropped - controller gone");
            }
        });

        deps.monitor.start_monitoring();

        let mut controller = Self {
            api: deps.api,
            store: deps.store,
            monitor: deps.monitor,
            navigator: deps.navigator,
            categories: Vec::new(),
            state: LoadState::Idle,
            network_notice: None,
            city: None,
            location_error: None,
            location_rx: rx,
            location_task: Some(location_task),
        };

        if let Err(e) = controller.fetch_categories().await {
            debug!(error = %e, "Initial category load failed");
        }
        controller
    }

    /// Load categories from the network, or from the store when offline.
    pub async fn fetch_categories(&mut self) -> Result<&[Category], DataError> {
        self.state = LoadState::Loading;
        let api = Arc::clone(&self.api);

        match load_or_fallback(&self.monitor, &self.store, || api.fetch_categories()).await {
            Ok(loaded) => {
                self.state = loaded.state();
                self.network_notice = loaded
                    .fallback()
                    .map(|reason| offline_notice(reason, self.store.cache_age::<Category>()));
                self.categories = loaded.records;
                info!(count = self.categories.len(), state = ?self.state, "Categories published");
                Ok(self.categories.as_slice())
            }
            Err(e) => {
                error!(error = %e, "Failed to load categories");
                self.state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Manual retry (pull to refresh).
    pub async fn refresh(&mut self) -> Result<&[Category], DataError> {
        info!("Refreshing categories");
        self.fetch_categories().await
    }

    /// Hand the chosen category to navigation. No data is touched.
    pub fn did_select_category(&self, category: &Category) {
        debug!(category_id = category.id, "Category selected");
        self.navigator.show_dish_list(category);
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Offline notice for the header, set only while showing cached data.
    pub fn network_notice(&self) -> Option<&str> {
        self.network_notice.as_deref()
    }

    pub fn city_label(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn location_error(&self) -> Option<&LocationError> {
        self.location_error.as_ref()
    }

    /// Apply any location result that arrived since the last call.
    /// Returns true when the header changed.
    pub fn check_location_updates(&mut self) -> bool {
        let mut changed = false;
        while let Ok(result) = self.location_rx.try_recv() {
            self.apply_location(result);
            changed = true;
        }
        changed
    }

    /// Wait for the next location result and apply it.
    /// Returns false once the lookup has finished and nothing more will arrive.
    pub async fn next_location_update(&mut self) -> bool {
        match self.location_rx.recv().await {
            Some(result) => {
                self.apply_location(result);
                true
            }
            None => false,
        }
    }

    fn apply_location(&mut self, result: Result<String, LocationError>) {
        match result {
            Ok(city) => {
                debug!(city = %city, "Location resolved");
                self.city = Some(city);
                self.location_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Location lookup failed");
                self.location_error = Some(e);
            }
        }
    }
}

impl<A> Drop for CategoryController<A> {
    fn drop(&mut self) {
        if let Some(task) = self.location_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::controller::testing::*;
    use crate::location::FixedLocation;

    #[tokio::test]
    async fn test_online_then_offline_scenario() {
        let store = Arc::new(RecordStore::in_memory());
        let api = StubApi::with_categories(vec![
            raw_category(1, "Soups", "u1"),
            raw_category(2, "Salads", "u2"),
        ]);
        let (deps, _) = deps(api, Arc::clone(&store), true);
        let api = Arc::clone(&deps.api);
        let monitor = Arc::clone(&deps.monitor);

        let mut controller = CategoryController::configure(deps, FixedLocation::default()).await;
        assert_eq!(controller.state(), &LoadState::Loaded);
        let names: Vec<&str> = controller.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Soups", "Salads"]);
        assert_eq!(store.count::<Category>().unwrap(), 2);
        assert!(controller.network_notice().is_none());

        monitor.set_available(false);
        let cached = controller.fetch_categories().await.unwrap().to_vec();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].id, 1);
        assert_eq!(cached[1].image_url, "u2");
        assert_eq!(controller.state(), &LoadState::LoadedFromCache);
        assert!(controller
            .network_notice()
            .unwrap()
            .starts_with("There is no access to the Internet."));
        assert_eq!(api.category_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_round_trip_through_store() {
        let store = Arc::new(RecordStore::in_memory());
        let api = StubApi::with_categories(vec![raw_category(9, "Desserts", "https://img/9.png")]);
        let (deps, _) = deps(api, Arc::clone(&store), true);

        let controller = CategoryController::configure(deps, FixedLocation::default()).await;
        let stored: Vec<Category> = store.fetch_all().unwrap();
        assert_eq!(stored, controller.categories());
        assert_eq!(stored[0].image_url, "https://img/9.png");
    }

    #[tokio::test]
    async fn test_failing_fetch_serves_cache() {
        let store = Arc::new(RecordStore::in_memory());
        store
            .upsert(&[Category {
                id: 4,
                name: "Pizza".to_string(),
                image_url: "u4".to_string(),
            }])
            .unwrap();
        let (deps, _) = deps(StubApi::failing_server(), store, true);

        let controller = CategoryController::configure(deps, FixedLocation::default()).await;
        assert_eq!(controller.state(), &LoadState::LoadedFromCache);
        assert_eq!(controller.categories()[0].name, "Pizza");
        let notice = controller.network_notice().unwrap();
        assert_eq!(notice, "The server is unavailable. Showing data saved just now.");
    }

    #[tokio::test]
    async fn test_empty_cache_offline_is_error() {
        let store = Arc::new(RecordStore::in_memory());
        let (deps, _) = deps(StubApi::default(), store, false);
        let api = Arc::clone(&deps.api);

        let mut controller = CategoryController::configure(deps, FixedLocation::default()).await;
        assert_eq!(
            controller.state(),
            &LoadState::Failed("There is no access to the Internet.".to_string())
        );
        assert!(controller.categories().is_empty());

        let err = controller.fetch_categories().await.unwrap_err();
        assert!(matches!(err, DataError::NoCachedData));
        assert_eq!(api.category_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_server_error_with_empty_cache_surfaces_fetch_error() {
        let store = Arc::new(RecordStore::in_memory());
        let (deps, _) = deps(StubApi::failing_server(), store, true);

        let mut controller = CategoryController::configure(deps, FixedLocation::default()).await;
        match controller.state() {
            LoadState::Failed(message) => assert!(message.contains("server error")),
            other => panic!("expected failure, got {:?}", other),
        }
        let err = controller.refresh().await.unwrap_err();
        assert!(matches!(err, DataError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_retry_after_failure_recovers() {
        let store = Arc::new(RecordStore::in_memory());
        let (deps, _) = deps(StubApi::default(), store, true);
        let api = Arc::clone(&deps.api);

        let mut controller = CategoryController::configure(deps, FixedLocation::default()).await;
        assert!(matches!(controller.state(), LoadState::Failed(_)));

        *api.categories.lock().unwrap() = Some(vec![raw_category(1, "Soups", "u1")]);
        assert_eq!(controller.refresh().await.unwrap().len(), 1);
        assert_eq!(controller.state(), &LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_location_is_separate_from_network_notice() {
        let store = Arc::new(RecordStore::in_memory());
        store
            .upsert(&[Category {
                id: 1,
                name: "Soups".to_string(),
                image_url: String::new(),
            }])
            .unwrap();
        let (deps, _) = deps(StubApi::default(), store, false);

        let mut controller =
            CategoryController::configure(deps, FixedLocation::new(Some("Казань".to_string()))).await;
        assert!(controller.next_location_update().await);

        assert_eq!(controller.city_label(), Some("Казань"));
        assert!(controller.network_notice().is_some());
        assert!(controller.location_error().is_none());
        assert!(!controller.next_location_update().await);
    }

    #[tokio::test]
    async fn test_location_failure_does_not_block_categories() {
        let store = Arc::new(RecordStore::in_memory());
        let api = StubApi::with_categories(vec![raw_category(1, "Soups", "u1")]);
        let (deps, _) = deps(api, store, true);

        let mut controller = CategoryController::configure(deps, FixedLocation::default()).await;
        assert_eq!(controller.state(), &LoadState::Loaded);

        controller.next_location_update().await;
        assert_eq!(controller.location_error(), Some(&LocationError::Unavailable));
        assert!(controller.city_label().is_none());
        assert!(!controller.check_location_updates());
    }

    #[tokio::test]
    async fn test_did_select_category_delegates() {
        let store = Arc::new(RecordStore::in_memory());
        let api = StubApi::with_categories(vec![raw_category(3, "Sushi", "u3")]);
        let (deps, navigator) = deps(api, Arc::clone(&store), true);

        let controller = CategoryController::configure(deps, FixedLocation::default()).await;
        let writes_before = store.saved_at::<Category>().unwrap();
        controller.did_select_category(&controller.categories()[0]);

        assert_eq!(*navigator.shown.lock().unwrap(), vec!["category:3".to_string()]);
        assert_eq!(store.saved_at::<Category>().unwrap(), writes_before);
    }
}
