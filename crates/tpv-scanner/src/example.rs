//! Collapsible example blocks.
//!
//! `example{` or `example(Title){` opens a block, `}` or `}example` closes it.

use regex::Regex;
use std::sync::LazyLock;

static EXAMPLE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^example\s*(?:\((?P<title>[^)]+)\))?\s*\{$").unwrap());

/// Summary shown when an example has no explicit title.
const DEFAULT_TITLE: &str = "Example";

/// Parse an example start marker from a trimmed line, returning its title.
#[must_use]
pub(crate) fn parse_start(trimmed: &str) -> Option<&str> {
    let caps = EXAMPLE_START.captures(trimmed)?;
    Some(caps.name("title").map_or(DEFAULT_TITLE, |m| m.as_str()))
}

/// Whether a trimmed line closes an open example.
#[must_use]
pub(crate) fn is_end(trimmed: &str) -> bool {
    trimmed == "}" || trimmed == "}example"
}

/// Opening wrapper for an example block.
#[must_use]
pub(crate) fn open_tag(title: &str) -> String {
    format!(r#"<details class="example" markdown="1"><summary>{title}</summary>"#)
}

/// Closing wrapper for an example block.
pub(crate) const CLOSE_TAG: &str = "</details>";
