//! Category counts and the uncategorized remainder.

use std::collections::HashMap;

use serde::Serialize;

use crate::classifier::taxonomy::{Category, Taxonomy};

/// Number of messages assigned to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Result of classifying a batch of records.
#[derive(Debug, Clone)]
pub struct ClassificationReport<T> {
    counts: Vec<CategoryCount>,
    uncategorized: Vec<T>,
    total: usize,
}

impl<T> ClassificationReport<T> {
    /// Tally classified records.
    ///
    /// Counts are ordered most frequent first; ties follow taxonomy order with
    /// `uncategorized` last. Categories with no records are omitted.
    pub fn build<I>(taxonomy: &Taxonomy, classified: I) -> Self
    where
        I: IntoIterator<Item = (T, Category)>,
    {
        let mut tally: HashMap<Category, usize> = HashMap::new();
        let mut uncategorized = Vec::new();
        let mut total = 0;

        for (record, category) in classified {
            total += 1;
            *tally.entry(category).or_default() += 1;
            if category == Category::Uncategorized {
                uncategorized.push(record);
            }
        }

        let mut counts: Vec<CategoryCount> = tally
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(taxonomy.rank(a.category).cmp(&taxonomy.rank(b.category)))
        });

        Self {
            counts,
            uncategorized,
            total,
        }
    }

    pub fn counts(&self) -> &[CategoryCount] {
        &self.counts
    }

    /// Count for one category (zero if absent).
    pub fn count(&self, category: Category) -> usize {
        self.counts
            .iter()
            .find(|c| c.category == category)
            .map_or(0, |c| c.count)
    }

    /// Records no taxonomy entry matched, in input order.
    pub fn uncategorized(&self) -> &[T] {
        &self.uncategorized
    }

    pub fn into_uncategorized(self) -> Vec<T> {
        self.uncategorized
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Category → count as a JSON object.
    pub fn counts_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .counts
            .iter()
            .map(|c| (c.category.to_string(), serde_json::Value::from(c.count)))
            .collect();
        serde_json::Value::Object(map)
    }
}
