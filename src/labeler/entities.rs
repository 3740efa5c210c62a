//! Multi-word entity table and phrase-aware tokenizer.
//!
//! Multi-word phrases (e.g. `ብስራተ ገብርኤል`) must survive tokenization as a
//! single unit. Instead of rewriting the message with a placeholder joiner,
//! the tokenizer first computes the byte spans covered by phrase matches and
//! treats whitespace inside those spans as a joiner rather than a separator.
//! Token text is always a slice of the original message, so de-joining is
//! exact and no other character of the message is touched.

use std::ops::Range;

use crate::error::LabelError;
use crate::labeler::tag::Tag;

/// A literal phrase and the tag it carries when it appears as a whole token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiWordEntity {
    pub phrase: String,
    pub tag: Tag,
}

/// Ordered phrase → tag table.
#[derive(Debug, Clone, Default)]
pub struct MultiWordTable {
    entries: Vec<MultiWordEntity>,
}

impl MultiWordTable {
    /// Create an empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table with the known multi-word locations.
    pub fn default_entities() -> Self {
        Self {
            entries: vec![MultiWordEntity {
                phrase: "ብስራተ ገብርኤል".into(),
                tag: Tag::InsideLocation,
            }],
        }
    }

    /// Append a phrase. Rejects blank phrases, surrounding whitespace and duplicates.
    pub fn insert(&mut self, phrase: &str, tag: Tag) -> Result<(), LabelError> {
        if phrase.trim().is_empty() {
            return Err(LabelError::InvalidPhrase {
                phrase: phrase.into(),
                reason: "phrase is blank".into(),
            });
        }
        if phrase.trim() != phrase {
            return Err(LabelError::InvalidPhrase {
                phrase: phrase.into(),
                reason: "phrase has leading or trailing whitespace".into(),
            });
        }
        if self.get(phrase).is_some() {
            return Err(LabelError::InvalidPhrase {
                phrase: phrase.into(),
                reason: "phrase already present".into(),
            });
        }
        self.entries.push(MultiWordEntity {
            phrase: phrase.into(),
            tag,
        });
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_entity(mut self, phrase: &str, tag: Tag) -> Result<Self, LabelError> {
        self.insert(phrase, tag)?;
        Ok(self)
    }

    /// Tag for a token that equals a phrase exactly.
    pub fn get(&self, token: &str) -> Option<Tag> {
        self.entries
            .iter()
            .find(|e| e.phrase == token)
            .map(|e| e.tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MultiWordEntity> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Byte spans of phrase occurrences that are joined into single tokens.
    ///
    /// Overlapping candidates are resolved longest match first, then leftmost,
    /// then by table order. The result is sorted by start offset and
    /// non-overlapping, and does not depend on the order phrases were inserted
    /// except to break exact ties.
    pub fn join_spans(&self, message: &str) -> Vec<Range<usize>> {
        let mut candidates: Vec<(usize, Range<usize>)> = Vec::new();
        for (order, entry) in self.entries.iter().enumerate() {
            for (start, matched) in message.match_indices(entry.phrase.as_str()) {
                candidates.push((order, start..start + matched.len()));
            }
        }

        candidates.sort_by(|(order_a, a), (order_b, b)| {
            b.len()
                .cmp(&a.len())
                .then(a.start.cmp(&b.start))
                .then(order_a.cmp(order_b))
        });

        let mut accepted: Vec<Range<usize>> = Vec::new();
        for (_, span) in candidates {
            let overlaps = accepted
                .iter()
                .any(|taken| span.start < taken.end && taken.start < span.end);
            if !overlaps {
                accepted.push(span);
            }
        }

        accepted.sort_by_key(|span| span.start);
        accepted
    }
}

/// A whitespace-delimited unit of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Slice of the original message.
    pub text: &'a str,
    /// Whether whitespace inside a phrase match was joined into this token.
    pub joined: bool,
}

/// Split a message on whitespace runs, keeping phrase matches whole.
pub fn tokenize<'a>(message: &'a str, table: &MultiWordTable) -> Vec<Token<'a>> {
    let spans = table.join_spans(message);
    let mut spans = spans.iter().peekable();

    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut joined = false;

    for (idx, ch) in message.char_indices() {
        while spans.next_if(|span| span.end <= idx).is_some() {}
        let inside = spans.peek().is_some_and(|span| span.start <= idx);

        if ch.is_whitespace() && !inside {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    text: &message[s..idx],
                    joined,
                });
                joined = false;
            }
            continue;
        }

        if start.is_none() {
            start = Some(idx);
        }
        if inside && ch.is_whitespace() {
            joined = true;
        }
    }

    if let Some(s) = start {
        tokens.push(Token {
            text: &message[s..],
            joined,
        });
    }

    tokens
}
