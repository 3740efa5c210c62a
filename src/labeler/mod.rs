//! Rule-based entity labeler.
//!
//! Converts one message into `(token, tag)` pairs suitable as NER training
//! data:
//! 1. Multi-word phrases are joined into single tokens (`entities`)
//! 2. The message is split on whitespace
//! 3. `@username` tokens are dropped
//! 4. Each remaining token runs through the rule cascade (`rules`); the first
//!    matching rule assigns the tag, otherwise the token is `O`

pub mod corpus;
pub mod entities;
pub mod rules;
pub mod tag;

pub use corpus::{CorpusWriter, format_block};
pub use entities::{MultiWordEntity, MultiWordTable, Token, tokenize};
pub use rules::{DEFAULT_CASCADE, Lexicon, TokenRule};
pub use tag::Tag;

use serde::Serialize;
use tracing::trace;

use crate::error::LabelError;

/// Prefix marking a username token.
const USERNAME_PREFIX: char = '@';

/// A token and the tag assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledToken {
    pub token: String,
    pub tag: Tag,
    /// Rule that assigned the tag; `None` for the `O` fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<TokenRule>,
}

impl LabeledToken {
    /// Corpus line: `<token> <tag>`.
    pub fn to_line(&self) -> String {
        format!("{} {}", self.token, self.tag)
    }
}

/// Stateless labeler over an immutable lexicon and rule cascade.
#[derive(Debug, Clone)]
pub struct EntityLabeler {
    lexicon: Lexicon,
    cascade: Vec<TokenRule>,
}

impl EntityLabeler {
    /// Labeler with an explicit lexicon and the full cascade.
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            lexicon,
            cascade: DEFAULT_CASCADE.to_vec(),
        }
    }

    /// Built-in lexicon with the given product keywords.
    pub fn with_products<I, S>(products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Lexicon::builtin();
        lexicon.set_products(products);
        Self::new(lexicon)
    }

    /// Replace the cascade. Rules are evaluated in the order given.
    pub fn with_cascade(mut self, cascade: Vec<TokenRule>) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn cascade(&self) -> &[TokenRule] {
        &self.cascade
    }

    /// Label a message. An empty message yields no pairs.
    pub fn label(&self, message: &str) -> Vec<LabeledToken> {
        tokenize(message, &self.lexicon.entities)
            .into_iter()
            .filter(|token| !token.text.starts_with(USERNAME_PREFIX))
            .map(|token| self.label_token(token.text))
            .collect()
    }

    /// Label a possibly-missing message from an upstream row.
    pub fn label_record(&self, message: Option<&str>) -> Result<Vec<LabeledToken>, LabelError> {
        let message = message.ok_or_else(|| {
            LabelError::InvalidInput("message is missing; drop missing rows before labeling".into())
        })?;
        Ok(self.label(message))
    }

    /// Run a single token through the cascade.
    pub fn label_token(&self, token: &str) -> LabeledToken {
        for rule in &self.cascade {
            if let Some(tag) = rule.evaluate(token, &self.lexicon) {
                trace!(token, rule = rule.name(), %tag, "Token matched rule");
                return LabeledToken {
                    token: token.to_string(),
                    tag,
                    rule: Some(*rule),
                };
            }
        }
        LabeledToken {
            token: token.to_string(),
            tag: Tag::Outside,
            rule: None,
        }
    }
}

impl Default for EntityLabeler {
    fn default() -> Self {
        Self::new(Lexicon::builtin())
    }
}
