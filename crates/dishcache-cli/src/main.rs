//! dishcache - browse the food catalog from the terminal.
//!
//! Runs one session the way the app screens do: load the categories (from
//! the network, or the local cache when offline), open one category, and
//! list its dishes, optionally filtered by a tag chip.
//!
//! Usage: `dishcache [--offline] [--init-config] [CATEGORY_ID] [TAG]`

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dishcache_core::{
    ApiClient, CatalogDeps, CatalogNavigator, Category, CategoryController, Config, Dish,
    DishController, FixedLocation, LoadState, NetworkMonitor, RecordStore,
};

/// Log file name prefix inside `log_dir`
const LOG_FILE_PREFIX: &str = "dishcache.log";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer; keep it alive until exit.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Command-line options. Positional: category id, then tag.
#[derive(Debug, Default)]
struct Args {
    offline: bool,
    init_config: bool,
    category_id: Option<i64>,
    tag: Option<String>,
}

impl Args {
    fn parse(raw: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = Self::default();
        let mut positional = Vec::new();
        for arg in raw {
            match arg.as_str() {
                "--offline" => args.offline = true,
                "--init-config" => args.init_config = true,
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        if let Some(id) = positional.next() {
            args.category_id = Some(
                id.parse()
                    .with_context(|| format!("Category id must be a number, got '{}'", id))?,
            );
        }
        args.tag = positional.next();
        Ok(args)
    }
}

/// Navigator that announces screen changes on stdout.
struct PrintNavigator;

impl CatalogNavigator for PrintNavigator {
    fn show_dish_list(&self, category: &Category) {
        println!("\n== {} ==", category.name);
    }

    fn show_dish_detail(&self, dish: &Dish) {
        println!("\n-- {} --", dish.name);
        println!("{} · {}", dish.display_price(), dish.display_weight());
        if !dish.description.is_empty() {
            println!("{}", dish.description);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = Config::load().context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config);
    info!("dishcache starting");

    if args.init_config {
        config.save().context("Failed to save configuration")?;
        println!("Configuration written to {}", Config::config_path()?.display());
        return Ok(());
    }

    let cache_dir = config.cache_dir()?;
    let store = RecordStore::open(cache_dir.clone())
        .with_context(|| format!("Failed to open record store at {}", cache_dir.display()))?;
    let api = ApiClient::new(config.endpoints.clone()).context("Failed to build HTTP client")?;
    let monitor = if args.offline {
        NetworkMonitor::manual(false)
    } else {
        NetworkMonitor::shared(config.probe.clone())
    };

    let deps = CatalogDeps {
        api: Arc::new(api),
        store: Arc::new(store),
        monitor,
        navigator: Arc::new(PrintNavigator),
        locale: config.locale,
    };

    let result = run_session(deps, &config, &args).await;
    info!("dishcache shutting down");
    result
}

async fn run_session(deps: CatalogDeps<ApiClient>, config: &Config, args: &Args) -> Result<()> {
    let mut categories =
        CategoryController::configure(deps.clone(), FixedLocation::new(config.city.clone())).await;
    categories.next_location_update().await;

    match categories.city_label() {
        Some(city) => println!("{}", city),
        None => {
            if let Some(e) = categories.location_error() {
                eprintln!("{}", e);
            }
        }
    }
    if let Some(notice) = categories.network_notice() {
        eprintln!("{}", notice);
    }
    if let LoadState::Failed(message) = categories.state() {
        anyhow::bail!("{}", message);
    }

    for category in categories.categories() {
        println!("{:>4}  {}", category.id, category.name);
    }

    let chosen = match args.category_id {
        Some(id) => categories
            .categories()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No category with id {}", id))?,
        None => match categories.categories().first() {
            Some(first) => first.clone(),
            None => return Ok(()),
        },
    };
    categories.did_select_category(&chosen);

    let mut dishes = DishController::configure(deps, chosen).await;
    if let Some(notice) = dishes.network_notice() {
        eprintln!("{}", notice);
    }
    if let LoadState::Failed(message) = dishes.state() {
        anyhow::bail!("{}", message);
    }

    println!("[{}]", dishes.tag_chips().join("] ["));
    if let Some(tag) = &args.tag {
        dishes
            .filter_dishes_by_label(tag)
            .context("Failed to filter dishes")?;
        println!("Filter: {}", dishes.active_tag().label(config.locale));
    }

    for dish in dishes.dishes() {
        println!(
            "{:>4}  {:<32} {:>8} {:>6}",
            dish.id,
            dish.name,
            dish.display_price(),
            dish.display_weight()
        );
    }
    if let Some(first) = dishes.dishes().first() {
        dishes.select_dish(first);
    }

    Ok(())
}
