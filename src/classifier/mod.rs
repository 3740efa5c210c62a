//! Script-aware keyword classifier.
//!
//! Amharic has no letter case, so messages containing Ethiopic characters are
//! matched case-sensitively as written. Other messages are lower-cased and
//! matched against lower-cased keywords, so `Birr`, `birr` and `BIRR` all hit
//! the same keyword.

pub mod report;
pub mod taxonomy;

pub use report::{CategoryCount, ClassificationReport};
pub use taxonomy::{Category, Taxonomy, TaxonomyEntry};

use tracing::trace;

use crate::text::is_amharic;

/// Stateless classifier over an immutable taxonomy.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    taxonomy: Taxonomy,
    /// Lower-cased keywords, parallel to `taxonomy.entries()`.
    folded: Vec<Vec<String>>,
}

impl CategoryClassifier {
    pub fn new(taxonomy: Taxonomy) -> Self {
        let folded = taxonomy
            .entries()
            .iter()
            .map(|e| e.keywords.iter().map(|k| k.to_lowercase()).collect())
            .collect();
        Self { taxonomy, folded }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Category of a possibly-missing message. Missing messages are uncategorized.
    pub fn classify(&self, message: Option<&str>) -> Category {
        match message {
            Some(text) => self.classify_text(text),
            None => Category::Uncategorized,
        }
    }

    /// Category of a message: the first taxonomy entry with a keyword in the text.
    pub fn classify_text(&self, message: &str) -> Category {
        let category = if is_amharic(message) {
            self.taxonomy
                .entries()
                .iter()
                .find(|e| e.keywords.iter().any(|k| message.contains(k.as_str())))
                .map(|e| e.category)
        } else {
            let lowered = message.to_lowercase();
            self.taxonomy
                .entries()
                .iter()
                .zip(&self.folded)
                .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k.as_str())))
                .map(|(e, _)| e.category)
        };

        let category = category.unwrap_or(Category::Uncategorized);
        trace!(%category, "Message classified");
        category
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new(Taxonomy::default_taxonomy())
    }
}
