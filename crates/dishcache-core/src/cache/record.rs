use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

/// The two tables of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Category,
    Dish,
}

impl RecordKind {
    /// File name (without extension) of the table on disk.
    pub fn file_stem(&self) -> &'static str {
        match self {
            RecordKind::Category => "categories",
            RecordKind::Dish => "dishes",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// A persisted domain entity identified by an integer key.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: RecordKind;

    /// Primary key; unique within the record's table.
    fn key(&self) -> i64;
}
