use serde::{Deserialize, Serialize};

use super::{DishTag, ValidationError};
use crate::cache::{Record, RecordKind};

/// A dish offered inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub price: u32,
    /// Grams
    pub weight: u32,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Dish {
    /// `All` matches every dish, including untagged ones.
    pub fn has_tag(&self, tag: DishTag) -> bool {
        tag.is_sentinel() || self.tags.iter().any(|raw| tag.matches(raw))
    }

    pub fn display_price(&self) -> String {
        format!("{} ₽", self.price)
    }

    pub fn display_weight(&self) -> String {
        format!("{}g", self.weight)
    }
}

impl Record for Dish {
    const KIND: RecordKind = RecordKind::Dish;

    fn key(&self) -> i64 {
        self.id
    }
}

/// Envelope returned by the dishes endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DishesResponse {
    pub dishes: Vec<DishResponse>,
}

/// Dish as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishResponse {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub weight: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub tegs: Vec<String>,
}

fn non_negative(id: i64, field: &'static str, value: i64) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange { id, field, value })
}

impl TryFrom<DishResponse> for Dish {
    type Error = ValidationError;

    fn try_from(raw: DishResponse) -> Result<Self, Self::Error> {
        if raw.id <= 0 {
            return Err(ValidationError::InvalidId(raw.id));
        }
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName(raw.id));
        }
        let price = non_negative(raw.id, "price", raw.price)?;
        let weight = non_negative(raw.id, "weight", raw.weight)?;

        Ok(Self {
            id: raw.id,
            name: name.to_string(),
            price,
            weight,
            description: raw.description,
            image_url: raw.image_url,
            tags: raw
                .tegs
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        })
    }
}
