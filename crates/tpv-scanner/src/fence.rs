//! Preview fence recognition.
//!
//! A preview fence opens with a run of three or more backticks or tildes, a
//! `typst` / `typst-code` language tag and a `+preview` directive:
//!
//! ```text
//! > ```typst +preview(vertical)
//! ```
//!
//! Lines are matched after their quote/indent prefix (`>`, space, tab). The
//! closing line must repeat the exact prefix and the exact marker run.

use regex::Regex;
use std::sync::LazyLock;

static PREVIEW_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<fence>~{3,}|`{3,})[ \t]*(?P<lang>typst(?:-code)?)[ \t]+.*(?P<preview>\+preview(?:\((?P<options>[^)]*)\))?)",
    )
    .unwrap()
});

/// Characters allowed in the quote/indent prefix of a line.
const PREFIX_CHARS: [char; 3] = ['>', ' ', '\t'];

/// Split off the leading quote/indent prefix of a line.
#[must_use]
pub(crate) fn leading_prefix(line: &str) -> &str {
    let end = line
        .find(|c: char| !PREFIX_CHARS.contains(&c))
        .unwrap_or(line.len());
    &line[..end]
}

/// Whether a line holds nothing but spaces and tabs.
#[must_use]
pub(crate) fn is_blank(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n'])
        .chars()
        .all(|c| c == ' ' || c == '\t')
}

/// Whether a line is a numbered annotation item under `prefix` (`<prefix><digits>...`).
#[must_use]
pub(crate) fn is_annotation_item(line: &str, prefix: &str) -> bool {
    line.strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// Opening line of a preview fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceMatch {
    /// Literal marker run (e.g. "```" or "~~~~").
    pub marker: String,
    /// Language tag (`typst` or `typst-code`).
    pub language: String,
    /// The full `+preview(...)` directive as written.
    pub directive: String,
    /// Raw text between the directive's parentheses (empty when absent).
    pub options: String,
    /// Quote/indent prefix preceding the marker.
    pub prefix: String,
}

impl FenceMatch {
    /// Match a line against the preview fence pattern.
    ///
    /// Returns `None` for ordinary lines, including fences without `+preview`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let prefix = leading_prefix(line);
        let caps = PREVIEW_START.captures(&line[prefix.len()..])?;

        Some(Self {
            marker: caps["fence"].to_owned(),
            language: caps["lang"].to_owned(),
            directive: caps["preview"].to_owned(),
            options: caps
                .name("options")
                .map(|m| m.as_str().to_owned())
                .unwrap_or_default(),
            prefix: prefix.to_owned(),
        })
    }

    /// Whether `line` closes this fence.
    ///
    /// Only the same prefix followed by the same marker run and optional
    /// trailing spaces/tabs qualifies; a longer or shorter run does not.
    #[must_use]
    pub fn is_terminator(&self, line: &str) -> bool {
        line.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(self.marker.as_str()))
            .is_some_and(is_blank)
    }
}
