//! Property-based tests for the entity labeler.

use proptest::prelude::*;

use ethio_ner_prep::classifier::{CategoryClassifier, Taxonomy};
use ethio_ner_prep::labeler::{EntityLabeler, Tag};

fn labeler() -> EntityLabeler {
    EntityLabeler::with_products(Taxonomy::default_taxonomy().product_keywords())
}

// Latin letters, digits and a few Ethiopic characters. No `@` and no
// multi-word phrase can be formed, so tokens are exactly the whitespace split.
fn plain_message() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .+ብርገጂ]{0,60}"
}

// Whitespace-free units: plain words, `@handles` and the one multi-word
// location. Joined with single spaces, every unit except a handle is
// exactly one labeled token.
fn message_unit() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9.+ብርገጂ]{1,8}",
        "@[a-z0-9_]{1,8}",
        Just("ብስራተ ገብርኤል".to_string()),
    ]
}

fn mixed_units() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(message_unit(), 0..12)
}

proptest! {
    #[test]
    fn every_tag_is_in_the_tag_set(message in any::<String>()) {
        for labeled in labeler().label(&message) {
            prop_assert!(Tag::ALL.contains(&labeled.tag));
        }
    }

    #[test]
    fn one_pair_per_whitespace_token(message in plain_message()) {
        let labeled = labeler().label(&message);
        let tokens: Vec<&str> = message.split_whitespace().collect();
        prop_assert_eq!(labeled.len(), tokens.len());
        for (pair, token) in labeled.iter().zip(tokens) {
            prop_assert_eq!(pair.token.as_str(), token);
        }
    }

    #[test]
    fn handles_drop_and_phrases_stay_whole(units in mixed_units()) {
        let message = units.join(" ");
        let labeled = labeler().label(&message);
        let expected: Vec<&str> = units
            .iter()
            .map(String::as_str)
            .filter(|unit| !unit.starts_with('@'))
            .collect();
        prop_assert_eq!(labeled.len(), expected.len());
        for (pair, unit) in labeled.iter().zip(expected) {
            prop_assert_eq!(pair.token.as_str(), unit);
            if unit == "ብስራተ ገብርኤል" {
                prop_assert_eq!(pair.tag, Tag::InsideLocation);
            }
        }
    }

    #[test]
    fn labeling_is_deterministic(message in any::<String>()) {
        let labeler = labeler();
        prop_assert_eq!(labeler.label(&message), labeler.label(&message));
    }

    #[test]
    fn no_username_survives(message in any::<String>()) {
        for labeled in labeler().label(&message) {
            prop_assert!(!labeled.token.starts_with('@'));
        }
    }

    #[test]
    fn classification_never_panics(message in any::<String>()) {
        let classifier = CategoryClassifier::default();
        let _ = classifier.classify_text(&message);
    }
}
