//! Category keyword taxonomy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Coarse message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Price,
    Location,
    Kids,
    Uncategorized,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Location => "location",
            Self::Kids => "kids",
            Self::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(Self::Price),
            "location" => Ok(Self::Location),
            "kids" => Ok(Self::Kids),
            "uncategorized" => Ok(Self::Uncategorized),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Keywords that trigger a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl TaxonomyEntry {
    pub fn new(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered category → keywords mapping. Earlier entries win.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    entries: Vec<TaxonomyEntry>,
}

impl Taxonomy {
    /// Build a taxonomy, rejecting the fallback category, repeated categories
    /// and empty keywords.
    pub fn new(entries: Vec<TaxonomyEntry>) -> Result<Self, ConfigError> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.category == Category::Uncategorized {
                return Err(ConfigError::InvalidValue {
                    key: "taxonomy".into(),
                    message: "uncategorized is the fallback and cannot have keywords".into(),
                });
            }
            if entries[..i].iter().any(|e| e.category == entry.category) {
                return Err(ConfigError::InvalidValue {
                    key: "taxonomy".into(),
                    message: format!("category {} listed twice", entry.category),
                });
            }
            if entry.keywords.iter().any(|k| k.is_empty()) {
                return Err(ConfigError::InvalidValue {
                    key: format!("taxonomy.{}", entry.category),
                    message: "empty keyword would match every message".into(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Price, location and kids categories with their trigger keywords.
    pub fn default_taxonomy() -> Self {
        Self {
            entries: vec![
                TaxonomyEntry::new(Category::Price, &["ብር", "ETB", "$", "Birr"]),
                TaxonomyEntry::new(Category::Location, &["ገርጂ", "4ኪሎ", "ብስራተ ገብርኤል"]),
                TaxonomyEntry::new(
                    Category::Kids,
                    &[
                        "toy",
                        "children",
                        "kids",
                        "መጫወቻ",
                        "play",
                        "games",
                        "fun",
                        "educational",
                        "puzzle",
                        "doll",
                        "action figure",
                        "stuffed animal",
                        "arts and crafts",
                        "books",
                        "outdoor toys",
                        "building blocks",
                        "baby",
                        "toddler",
                        "Baby",
                        "መጫወቻዎች",
                    ],
                ),
            ],
        }
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    /// Keywords for a category, if it is in the taxonomy.
    pub fn keywords(&self, category: Category) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.keywords.as_slice())
    }

    /// Keywords the labeler tags as products.
    pub fn product_keywords(&self) -> Vec<String> {
        self.keywords(Category::Kids)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// Position of a category in iteration order; the fallback sorts last.
    pub fn rank(&self, category: Category) -> usize {
        self.entries
            .iter()
            .position(|e| e.category == category)
            .unwrap_or(self.entries.len())
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::default_taxonomy()
    }
}
