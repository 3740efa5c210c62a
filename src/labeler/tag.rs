//! Token tag vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tag assigned to a token by the rule cascade.
///
/// Locations and prices only ever carry the `I-` prefix and products only the
/// `B-` prefix. Downstream training consumes exactly this vocabulary, so it is
/// kept closed rather than normalized to full BIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    #[serde(rename = "I-LOC")]
    InsideLocation,
    #[serde(rename = "I-PRICE")]
    InsidePrice,
    #[serde(rename = "B-PRODUCT")]
    BeginProduct,
    #[serde(rename = "O")]
    Outside,
}

impl Tag {
    /// Every tag the labeler can emit.
    pub const ALL: [Tag; 4] = [
        Tag::InsideLocation,
        Tag::InsidePrice,
        Tag::BeginProduct,
        Tag::Outside,
    ];

    /// Wire label used in the labeled corpus.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsideLocation => "I-LOC",
            Self::InsidePrice => "I-PRICE",
            Self::BeginProduct => "B-PRODUCT",
            Self::Outside => "O",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown tag: {s}"))
    }
}
