//! Ordered token rule cascade.
//!
//! Each token is checked against the cascade top to bottom and the first rule
//! that returns a tag wins. Tokens no rule claims are tagged `O` by the
//! labeler.
//!
//! Phone numbers are checked before price amounts: a 10–15 digit token looks
//! numeric but must never be tagged as a price.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::labeler::entities::MultiWordTable;
use crate::labeler::tag::Tag;

/// Single-word location substrings.
pub const LOCATION_KEYWORDS: &[&str] = &["ገርጂ", "4ኪሎ"];

/// Substrings that mark a token as a price.
pub const CURRENCY_MARKERS: &[&str] = &["ብር", "Birr", "ETB"];

/// Numeric tokens must be shorter than this (in characters) to count as prices.
pub const MAX_PRICE_CHARS: usize = 9;

static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{10,15}$").expect("phone pattern is a valid regex"));

static PRICE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d{1,2})?$").expect("price pattern is a valid regex"));

/// Keyword lists the cascade matches against.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub entities: MultiWordTable,
    pub locations: Vec<String>,
    pub currency_markers: Vec<String>,
    /// Stored lower-cased.
    products: Vec<String>,
}

impl Lexicon {
    pub fn new(
        entities: MultiWordTable,
        locations: Vec<String>,
        currency_markers: Vec<String>,
        products: Vec<String>,
    ) -> Self {
        let mut lexicon = Self {
            entities,
            locations,
            currency_markers,
            products: Vec::new(),
        };
        lexicon.set_products(products);
        lexicon
    }

    /// Built-in locations and currency markers, no product keywords.
    pub fn builtin() -> Self {
        Self::new(
            MultiWordTable::default_entities(),
            LOCATION_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            CURRENCY_MARKERS.iter().map(|s| s.to_string()).collect(),
            Vec::new(),
        )
    }

    /// Replace the product keyword list.
    pub fn set_products<I, S>(&mut self, products: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.products = products
            .into_iter()
            .map(|p| p.as_ref().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self.products.sort();
        self.products.dedup();
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    fn is_product(&self, token: &str) -> bool {
        let lowered = token.to_lowercase();
        self.products.iter().any(|p| *p == lowered)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A rule in the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenRule {
    /// Token equals a multi-word table key.
    MultiWordEntity,
    /// Token contains a location keyword.
    Location,
    /// Optional leading `+` and 10–15 digits.
    PhoneNumber,
    /// Integer with an optional 1–2 digit fraction, shorter than 9 chars.
    PriceAmount,
    /// Token contains a currency marker.
    CurrencyMarker,
    /// Token equals a product keyword, ignoring case.
    ProductKeyword,
}

/// The full cascade in precedence order.
pub const DEFAULT_CASCADE: [TokenRule; 6] = [
    TokenRule::MultiWordEntity,
    TokenRule::Location,
    TokenRule::PhoneNumber,
    TokenRule::PriceAmount,
    TokenRule::CurrencyMarker,
    TokenRule::ProductKeyword,
];

impl TokenRule {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MultiWordEntity => "multi_word_entity",
            Self::Location => "location",
            Self::PhoneNumber => "phone_number",
            Self::PriceAmount => "price_amount",
            Self::CurrencyMarker => "currency_marker",
            Self::ProductKeyword => "product_keyword",
        }
    }

    /// Tag the rule assigns, or `None` if the token does not match.
    pub fn evaluate(&self, token: &str, lexicon: &Lexicon) -> Option<Tag> {
        match self {
            Self::MultiWordEntity => lexicon.entities.get(token),
            Self::Location => lexicon
                .locations
                .iter()
                .any(|loc| token.contains(loc.as_str()))
                .then_some(Tag::InsideLocation),
            Self::PhoneNumber => PHONE_NUMBER.is_match(token).then_some(Tag::Outside),
            Self::PriceAmount => (PRICE_AMOUNT.is_match(token)
                && token.chars().count() < MAX_PRICE_CHARS)
                .then_some(Tag::InsidePrice),
            Self::CurrencyMarker => lexicon
                .currency_markers
                .iter()
                .any(|marker| token.contains(marker.as_str()))
                .then_some(Tag::InsidePrice),
            Self::ProductKeyword => lexicon.is_product(token).then_some(Tag::BeginProduct),
        }
    }
}
