//! Dish screen controller, scoped to one category.
//!
//! Fetched dishes are stored store-wide, exactly as the backend returned
//! them; the mock dishes endpoint ignores the category, so nothing in the
//! response says which category a dish belongs to. Filtering therefore
//! always works on the whole dish table.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::{load_or_fallback, offline_notice, CatalogDeps, CatalogNavigator, DataError, LoadState};
use crate::api::CatalogApi;
use crate::cache::RecordStore;
use crate::connectivity::NetworkMonitor;
use crate::models::{Category, Dish, DishTag, Locale};

/// Backs the dish list of one category, with its tag chips.
pub struct DishController<A> {
    api: Arc<A>,
    store: Arc<RecordStore>,
    monitor: Arc<NetworkMonitor>,
    navigator: Arc<dyn CatalogNavigator>,
    locale: Locale,
    category: Category,

    dishes: Vec<Dish>,
    active_tag: DishTag,
    state: LoadState,
    network_notice: Option<String>,
}

impl<A: CatalogApi> DishController<A> {
    /// Wire dependencies for `category` and run the first load.
    ///
    /// A failed first load is not returned; it is recorded in `state()`.
    pub async fn configure(deps: CatalogDeps<A>, category: Category) -> Self {
        deps.monitor.start_monitoring();

        let mut controller = Self {
            api: deps.api,
            store: deps.store,
            monitor: deps.monitor,
            navigator: deps.navigator,
            locale: deps.locale,
            category,
            dishes: Vec::new(),
            active_tag: DishTag::All,
            state: LoadState::Idle,
            network_notice: None,
        };

        if let Err(e) = controller.fetch_dishes().await {
            debug!(error = %e, "Initial dish load failed");
        }
        controller
    }

    /// Load the category's dishes from the network, or from the store when offline.
    /// A completed load resets the active filter to `All`.
    pub async fn fetch_dishes(&mut self) -> Result<&[Dish], DataError> {
        self.state = LoadState::Loading;
        let api = Arc::clone(&self.api);
        let category_id = self.category.id;

        match load_or_fallback(&self.monitor, &self.store, || api.fetch_dishes(category_id)).await {
            Ok(loaded) => {
                self.state = loaded.state();
                self.network_notice = loaded
                    .fallback()
                    .map(|reason| offline_notice(reason, self.store.cache_age::<Dish>()));
                self.dishes = loaded.records;
                self.active_tag = DishTag::All;
                info!(
                    category_id,
                    count = self.dishes.len(),
                    state = ?self.state,
                    "Dishes published"
                );
                Ok(self.dishes.as_slice())
            }
            Err(e) => {
                error!(category_id, error = %e, "Failed to load dishes");
                self.state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Manual retry (pull to refresh).
    pub async fn refresh(&mut self) -> Result<&[Dish], DataError> {
        info!(category_id = self.category.id, "Refreshing dishes");
        self.fetch_dishes().await
    }

    /// Re-read the dish table and keep the dishes carrying `tag`; `All` keeps everything.
    pub fn filter_dishes(&mut self, tag: DishTag) -> Result<&[Dish], DataError> {
        let all: Vec<Dish> = self.store.fetch_all()?;
        let total = all.len();

        self.dishes = if tag.is_sentinel() {
            all
        } else {
            all.into_iter().filter(|dish| dish.has_tag(tag)).collect()
        };
        self.active_tag = tag;
        debug!(tag = %tag, total, shown = self.dishes.len(), "Filtered dishes");
        Ok(self.dishes.as_slice())
    }

    /// Filter by a chip label as shown on screen. Unknown labels leave the list as is.
    pub fn filter_dishes_by_label(&mut self, label: &str) -> Result<&[Dish], DataError> {
        match DishTag::from_label(label) {
            Some(tag) => self.filter_dishes(tag),
            None => {
                debug!(label = label, "Ignoring unknown tag label");
                Ok(self.dishes.as_slice())
            }
        }
    }

    /// Ask navigation to open the dish detail screen.
    pub fn select_dish(&self, dish: &Dish) {
        debug!(dish_id = dish.id, "Dish selected");
        self.navigator.show_dish_detail(dish);
    }

    /// Whichever list was published last: the fetch result or a filter result.
    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn active_tag(&self) -> DishTag {
        self.active_tag
    }

    pub fn tag_chips(&self) -> Vec<&'static str> {
        DishTag::chips(self.locale)
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn network_notice(&self) -> Option<&str> {
        self.network_notice.as_deref()
    }
}
