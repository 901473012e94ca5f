use serde::{Deserialize, Serialize};

use super::ValidationError;
use crate::cache::{Record, RecordKind};

/// A menu category as shown on the main screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub image_url: String,
}

impl Record for Category {
    const KIND: RecordKind = RecordKind::Category;

    fn key(&self) -> i64 {
        self.id
    }
}

/// Envelope returned by the categories endpoint.
///
/// One backend variant spells the key with a Cyrillic "С"; both spellings decode.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesResponse {
    #[serde(alias = "сategories")]
    pub categories: Vec<CategoryResponse>,
}

/// Category as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
}

impl TryFrom<CategoryResponse> for Category {
    type Error = ValidationError;

    fn try_from(raw: CategoryResponse) -> Result<Self, Self::Error> {
        if raw.id <= 0 {
            return Err(ValidationError::InvalidId(raw.id));
        }
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName(raw.id));
        }
        Ok(Self {
            id: raw.id,
            name: name.to_string(),
            image_url: raw.image_url,
        })
    }
}
