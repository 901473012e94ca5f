use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Record, RecordKind, StoreError};
use crate::models::{Category, Dish};

/// Version written into every table file.
/// Files from a newer library version are refused rather than misread.
pub const SCHEMA_VERSION: u32 = 1;

/// On-disk envelope of one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTable<T> {
    #[serde(default)]
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub records: Vec<T>,
}

/// Human readable age bucket for a table written `minutes` ago.
fn age_display(minutes: i64) -> String {
    if minutes < 1 {
        // Negative ages come from clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

#[derive(Debug)]
struct Table<R> {
    rows: IndexMap<i64, R>,
    saved_at: Option<DateTime<Utc>>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: IndexMap::new(),
            saved_at: None,
        }
    }
}

/// Lock-protected in-memory copy of one table.
#[derive(Debug)]
pub struct TableSlot<R>(Mutex<Table<R>>);

impl<R: Record> TableSlot<R> {
    fn new(table: Table<R>) -> Self {
        Self(Mutex::new(table))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Table<R>>, StoreError> {
        self.0.lock().map_err(|_| StoreError::Poisoned(R::KIND))
    }
}

/// Record kinds the store has a table for.
pub trait Stored: Record {
    fn slot(store: &RecordStore) -> &TableSlot<Self>;
}

impl Stored for Category {
    fn slot(store: &RecordStore) -> &TableSlot<Self> {
        &store.categories
    }
}

impl Stored for Dish {
    fn slot(store: &RecordStore) -> &TableSlot<Self> {
        &store.dishes
    }
}

/// Key-identified storage for categories and dishes.
///
/// Each kind has its own lock, so the category and dish screens can write
/// at the same time. Every `upsert` call is all-or-nothing: the new table is
/// written to a temporary file and renamed over the old one before the
/// in-memory copy is replaced.
#[derive(Debug)]
pub struct RecordStore {
    cache_dir: Option<PathBuf>,
    categories: TableSlot<Category>,
    dishes: TableSlot<Dish>,
}

impl RecordStore {
    /// Open (or create) a store backed by JSON files in `cache_dir`.
    pub fn open(cache_dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&cache_dir)?;
        let categories = TableSlot::new(load_table::<Category>(&cache_dir)?);
        let dishes = TableSlot::new(load_table::<Dish>(&cache_dir)?);
        debug!(path = %cache_dir.display(), "Opened record store");

        Ok(Self {
            cache_dir: Some(cache_dir),
            categories,
            dishes,
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            cache_dir: None,
            categories: TableSlot::new(Table::default()),
            dishes: TableSlot::new(Table::default()),
        }
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    /// Insert or overwrite every record by key. Returns the number of records written.
    ///
    /// Records keep the position of their first insertion. When persisting
    /// fails the table is left exactly as it was.
    pub fn upsert<R: Stored>(&self, records: &[R]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut table = R::slot(self).lock()?;
        let mut staged = table.rows.clone();
        for record in records {
            staged.insert(record.key(), record.clone());
        }

        let saved_at = Utc::now();
        if let Some(ref dir) = self.cache_dir {
            persist_table(dir, &staged, saved_at)?;
        }

        table.rows = staged;
        table.saved_at = Some(saved_at);
        debug!(
            kind = %R::KIND,
            upserted = records.len(),
            total = table.rows.len(),
            "Upserted records"
        );
        Ok(records.len())
    }

    /// Every record of the kind, in insertion order.
    pub fn fetch_all<R: Stored>(&self) -> Result<Vec<R>, StoreError> {
        let table = R::slot(self).lock()?;
        Ok(table.rows.values().cloned().collect())
    }

    pub fn exists<R: Stored>(&self, key: i64) -> Result<bool, StoreError> {
        let table = R::slot(self).lock()?;
        Ok(table.rows.contains_key(&key))
    }

    pub fn get<R: Stored>(&self, key: i64) -> Result<Option<R>, StoreError> {
        let table = R::slot(self).lock()?;
        Ok(table.rows.get(&key).cloned())
    }

    pub fn count<R: Stored>(&self) -> Result<usize, StoreError> {
        let table = R::slot(self).lock()?;
        Ok(table.rows.len())
    }

    /// When the table was last written, `None` if it never was.
    pub fn saved_at<R: Stored>(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let table = R::slot(self).lock()?;
        Ok(table.saved_at)
    }

    /// Human readable age of a table ("5m ago"), logging errors without failing.
    pub fn cache_age<R: Stored>(&self) -> Option<String> {
        match self.saved_at::<R>() {
            Ok(Some(saved_at)) => Some(age_display((Utc::now() - saved_at).num_minutes())),
            Ok(None) => None,
            Err(e) => {
                debug!(kind = %R::KIND, error = %e, "Failed to read table age");
                None
            }
        }
    }
}

fn table_path(dir: &Path, kind: RecordKind) -> PathBuf {
    dir.join(format!("{}.json", kind.file_stem()))
}

fn load_table<R: Record>(dir: &Path) -> Result<Table<R>, StoreError> {
    let path = table_path(dir, R::KIND);
    if !path.exists() {
        return Ok(Table::default());
    }

    let contents = std::fs::read_to_string(&path)?;
    let stored: StoredTable<R> =
        serde_json::from_str(&contents).map_err(|source| StoreError::Serialization {
            kind: R::KIND,
            source,
        })?;

    if stored.schema_version > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema {
            kind: R::KIND,
            found: stored.schema_version,
            supported: SCHEMA_VERSION,
        });
    }

    let mut rows = IndexMap::with_capacity(stored.records.len());
    for record in stored.records {
        if rows.insert(record.key(), record).is_some() {
            warn!(kind = %R::KIND, "Duplicate key in table file, keeping last");
        }
    }
    debug!(kind = %R::KIND, count = rows.len(), "Loaded table");

    Ok(Table {
        rows,
        saved_at: Some(stored.saved_at),
    })
}

fn persist_table<R: Record>(
    dir: &Path,
    rows: &IndexMap<i64, R>,
    saved_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    let table = StoredTable {
        schema_version: SCHEMA_VERSION,
        saved_at,
        records: rows.values().collect::<Vec<&R>>(),
    };
    let contents =
        serde_json::to_string_pretty(&table).map_err(|source| StoreError::Serialization {
            kind: R::KIND,
            source,
        })?;

    let path = table_path(dir, R::KIND);
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn category(id: i64, name: &str, image: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            image_url: image.to_string(),
        }
    }

    fn dish(id: i64, tags: &[&str]) -> Dish {
        Dish {
            id,
            name: format!("Dish {}", id),
            price: 100,
            weight: 250,
            description: String::new(),
            image_url: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_upsert_is_idempotent_and_last_write_wins() {
        let store = RecordStore::in_memory();
        store.upsert(&[category(1, "Soups", "u1")]).unwrap();
        store.upsert(&[category(1, "Hot soups", "u1b")]).unwrap();

        let all: Vec<Category> = store.fetch_all().unwrap();
        assert_eq!(all, vec![category(1, "Hot soups", "u1b")]);
    }

    #[test]
    fn test_fetch_all_keeps_insertion_order() {
        let store = RecordStore::in_memory();
        store
            .upsert(&[category(3, "C", ""), category(1, "A", "")])
            .unwrap();
        store
            .upsert(&[category(2, "B", ""), category(3, "C2", "")])
            .unwrap();

        let ids: Vec<i64> = store
            .fetch_all::<Category>()
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(store.get::<Category>(3).unwrap().unwrap().name, "C2");
    }

    #[test]
    fn test_exists_is_scoped_by_kind() {
        let store = RecordStore::in_memory();
        store.upsert(&[category(5, "Pizza", "")]).unwrap();

        assert!(store.exists::<Category>(5).unwrap());
        assert!(!store.exists::<Dish>(5).unwrap());
        assert!(!store.exists::<Category>(6).unwrap());
    }

    #[test]
    fn test_empty_upsert_does_not_touch_table() {
        let store = RecordStore::in_memory();
        assert_eq!(store.upsert::<Dish>(&[]).unwrap(), 0);
        assert!(store.saved_at::<Dish>().unwrap().is_none());
        assert!(store.cache_age::<Dish>().is_none());
    }

    #[test]
    fn test_tables_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");

        {
            let store = RecordStore::open(path.clone()).unwrap();
            store
                .upsert(&[category(1, "Soups", "u1"), category(2, "Salads", "u2")])
                .unwrap();
            store.upsert(&[dish(10, &["salad"])]).unwrap();
        }

        let reopened = RecordStore::open(path.clone()).unwrap();
        assert_eq!(
            reopened.fetch_all::<Category>().unwrap(),
            vec![category(1, "Soups", "u1"), category(2, "Salads", "u2")]
        );
        assert_eq!(reopened.fetch_all::<Dish>().unwrap(), vec![dish(10, &["salad"])]);
        assert_eq!(reopened.cache_age::<Category>().as_deref(), Some("just now"));
        assert!(!path.join("categories.json.tmp").exists());
    }

    #[test]
    fn test_failed_write_leaves_table_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        let store = RecordStore::open(path.clone()).unwrap();
        store.upsert(&[category(1, "Soups", "u1")]).unwrap();

        // Pull the directory out from under the store so the next write fails
        std::fs::remove_dir_all(&path).unwrap();

        let result = store.upsert(&[category(1, "Changed", "x"), category(2, "New", "y")]);
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(
            store.fetch_all::<Category>().unwrap(),
            vec![category(1, "Soups", "u1")]
        );
        assert!(!store.exists::<Category>(2).unwrap());
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let table = StoredTable {
            schema_version: SCHEMA_VERSION + 1,
            saved_at: Utc::now(),
            records: vec![category(1, "Soups", "u1")],
        };
        std::fs::write(
            dir.path().join("categories.json"),
            serde_json::to_string(&table).unwrap(),
        )
        .unwrap();

        let err = RecordStore::open(dir.path().to_path_buf()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedSchema {
                kind: RecordKind::Category,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_table_reports_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dishes.json"), "{not json").unwrap();

        let err = RecordStore::open(dir.path().to_path_buf()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Serialization {
                kind: RecordKind::Dish,
                ..
            }
        ));
    }

    #[test]
    fn test_concurrent_writes_to_different_kinds() {
        let store = RecordStore::in_memory();
        std::thread::scope(|s| {
            s.spawn(|| {
                for id in 1..=50 {
                    store.upsert(&[category(id, "C", "")]).unwrap();
                }
            });
            s.spawn(|| {
                for id in 1..=50 {
                    store.upsert(&[dish(id, &[])]).unwrap();
                }
            });
        });

        assert_eq!(store.count::<Category>().unwrap(), 50);
        assert_eq!(store.count::<Dish>().unwrap(), 50);
    }

    #[test]
    fn test_age_display_buckets() {
        assert_eq!(age_display(-3), "just now");
        assert_eq!(age_display(0), "just now");
        assert_eq!(age_display(5), "5m ago");
        assert_eq!(age_display(95), "2h ago");
        assert_eq!(age_display(80), "1h ago");
        assert_eq!(age_display(1440 + 60), "1d ago");
        assert_eq!(age_display(2 * 1440 + 13 * 60), "3d ago");
    }

    #[test]
    fn test_cache_age_follows_saved_at() {
        let store = RecordStore::in_memory();
        store.upsert(&[category(1, "Soups", "u1")]).unwrap();
        store.categories.lock().unwrap().saved_at = Some(Utc::now() - Duration::minutes(95));

        assert_eq!(store.cache_age::<Category>().as_deref(), Some("2h ago"));
        assert!(store.cache_age::<Dish>().is_none());
    }
}
