//! Dish filter vocabulary.
//!
//! Dishes carry free-form tag strings ("tegs" on the wire). Depending on the
//! backend those strings are either the tag keys (`salad`) or the localized
//! chip labels (`Салаты`), so matching accepts both.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display language for tag labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ru];
}

/// Filter chip shown above the dish list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishTag {
    /// Not a real filter: every dish is shown.
    #[default]
    All,
    Salad,
    Rice,
    Fish,
}

impl DishTag {
    /// Chip order on screen.
    pub const ALL: [DishTag; 4] = [DishTag::All, DishTag::Salad, DishTag::Rice, DishTag::Fish];

    pub fn key(&self) -> &'static str {
        match self {
            DishTag::All => "all",
            DishTag::Salad => "salad",
            DishTag::Rice => "rice",
            DishTag::Fish => "fish",
        }
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (DishTag::All, Locale::En) => "All menu",
            (DishTag::All, Locale::Ru) => "Все меню",
            (DishTag::Salad, Locale::En) => "Salads",
            (DishTag::Salad, Locale::Ru) => "Салаты",
            (DishTag::Rice, Locale::En) => "With rice",
            (DishTag::Rice, Locale::Ru) => "С рисом",
            (DishTag::Fish, Locale::En) => "With fish",
            (DishTag::Fish, Locale::Ru) => "С рыбой",
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, DishTag::All)
    }

    /// Whether a stored tag string names this tag, by key or by any localized label.
    pub fn matches(&self, raw: &str) -> bool {
        let raw = raw.trim();
        raw.eq_ignore_ascii_case(self.key())
            || Locale::ALL
                .iter()
                .any(|&locale| raw.to_lowercase() == self.label(locale).to_lowercase())
    }

    /// Resolve a key or chip label (as tapped in the UI) back to a tag.
    pub fn from_label(raw: &str) -> Option<DishTag> {
        Self::ALL.into_iter().find(|tag| tag.matches(raw))
    }

    /// Chip labels in screen order.
    pub fn chips(locale: Locale) -> Vec<&'static str> {
        Self::ALL.iter().map(|tag| tag.label(locale)).collect()
    }
}

impl fmt::Display for DishTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matches_key_and_labels() {
        assert!(DishTag::Salad.matches("salad"));
        assert!(DishTag::Salad.matches("SALAD"));
        assert!(DishTag::Salad.matches("Salads"));
        assert!(DishTag::Salad.matches("Салаты"));
        assert!(DishTag::Rice.matches(" С рисом "));
        assert!(!DishTag::Salad.matches("fish"));
        assert!(!DishTag::Fish.matches("С рисом"));
    }

    #[test]
    fn test_from_label() {
        assert_eq!(DishTag::from_label("Все меню"), Some(DishTag::All));
        assert_eq!(DishTag::from_label("With fish"), Some(DishTag::Fish));
        assert_eq!(DishTag::from_label("rice"), Some(DishTag::Rice));
        assert_eq!(DishTag::from_label("desserts"), None);
    }

    #[test]
    fn test_chips_order() {
        assert_eq!(
            DishTag::chips(Locale::En),
            vec!["All menu", "Salads", "With rice", "With fish"]
        );
        assert_eq!(DishTag::chips(Locale::Ru)[0], "Все меню");
    }

    #[test]
    fn test_locale_serde() {
        let locale: Locale = serde_json::from_str("\"ru\"").expect("locale");
        assert_eq!(locale, Locale::Ru);
        assert_eq!(DishTag::default(), DishTag::All);
        assert!(DishTag::All.is_sentinel());
        assert_eq!(DishTag::Fish.to_string(), "fish");
    }
}
