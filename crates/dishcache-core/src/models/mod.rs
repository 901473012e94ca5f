//! Data models for the food catalog.
//!
//! This module contains the records served to the screens and persisted in
//! the record store:
//!
//! - `Category`, `CategoryResponse`: menu categories and their wire shape
//! - `Dish`, `DishResponse`: dishes and their wire shape
//! - `DishTag`, `Locale`: the filter vocabulary and its display labels
//!
//! Wire shapes are decoded straight from JSON and converted into the domain
//! records with `TryFrom`, which rejects records that cannot be displayed.

pub mod category;
pub mod dish;
pub mod tag;

use thiserror::Error;

pub use category::{CategoriesResponse, Category, CategoryResponse};
pub use dish::{Dish, DishResponse, DishesResponse};
pub use tag::{DishTag, Locale};

/// Reason a transfer record was refused at the mapping boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid id: {0}")]
    InvalidId(i64),

    #[error("Record {0} has an empty name")]
    EmptyName(i64),

    #[error("Record {id} has an out-of-range {field}: {value}")]
    OutOfRange {
        id: i64,
        field: &'static str,
        value: i64,
    },
}
