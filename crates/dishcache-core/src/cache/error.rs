use thiserror::Error;

use super::RecordKind;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode {kind} table: {source}")]
    Serialization {
        kind: RecordKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} table has schema version {found}, newest supported is {supported}")]
    UnsupportedSchema {
        kind: RecordKind,
        found: u32,
        supported: u32,
    },

    #[error("{0} table lock poisoned")]
    Poisoned(RecordKind),
}
