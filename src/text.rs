//! Script detection and emoji stripping.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// First codepoint of the Ethiopic block.
pub const ETHIOPIC_START: char = '\u{1200}';
/// Last codepoint of the Ethiopic block used for script detection.
pub const ETHIOPIC_END: char = '\u{137F}';

static EMOJI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "[",
        r"\x{1F600}-\x{1F64F}", // emoticons
        r"\x{1F300}-\x{1F5FF}", // symbols & pictographs
        r"\x{1F680}-\x{1F6FF}", // transport & map
        r"\x{1F700}-\x{1F77F}", // alchemical
        r"\x{1F1E0}-\x{1F1FF}", // flags
        r"\x{2500}-\x{2BEF}",
        r"\x{2702}-\x{27B0}",
        r"\x{1F900}-\x{1F9FF}",
        r"\x{2600}-\x{26FF}",
        r"\x{FE0F}\x{20E3}", // keycap combiners
        "]+",
    ))
    .expect("emoji pattern is a valid regex")
});

/// Returns true if the text contains at least one Ethiopic (Amharic) character.
pub fn is_amharic(text: &str) -> bool {
    text.chars()
        .any(|c| (ETHIOPIC_START..=ETHIOPIC_END).contains(&c))
}

/// Remove emoji runs from the text. Borrows when nothing was removed.
pub fn remove_emojis(text: &str) -> Cow<'_, str> {
    EMOJI_PATTERN.replace_all(text, "")
}
