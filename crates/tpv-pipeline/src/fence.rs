//! Fenced code block recognition for the preview pass.
//!
//! Runs on scanner output. Fences whose info string starts with
//! `typst-preview` are handed to the formatter; every other fence is skipped
//! as a whole so its content is never mistaken for a preview.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tpv_scanner::PREVIEW_LANGUAGE;

static FENCE_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>[> \t]*)(?P<fence>~{3,}|`{3,})[ \t]*(?P<info>.*)$").unwrap()
});

/// Opening line of a fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FenceOpen<'a> {
    pub prefix: &'a str,
    pub marker: &'a str,
    pub info: &'a str,
}

impl<'a> FenceOpen<'a> {
    /// Match a fence opening line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = FENCE_START.captures(line)?;
        let info = caps.name("info").map_or("", |m| m.as_str().trim_end());
        // A backtick fence's info string cannot contain backticks.
        let marker = caps.name("fence")?.as_str();
        if marker.starts_with('`') && info.contains('`') {
            return None;
        }
        Some(Self {
            prefix: caps.name("prefix")?.as_str(),
            marker,
            info,
        })
    }

    /// Whether this fence is a nested preview fence.
    pub fn is_preview(&self) -> bool {
        self.info
            .split_whitespace()
            .next()
            .is_some_and(|lang| lang == PREVIEW_LANGUAGE)
    }

    /// Whether `line` closes this fence.
    ///
    /// Preview fences close on their exact marker. Other fences close on a run
    /// of the same character at least as long as the opening one.
    pub fn is_terminator(&self, line: &str) -> bool {
        let Some(rest) = line.strip_prefix(self.prefix) else {
            return false;
        };
        let rest = if self.is_preview() {
            rest.strip_prefix(self.marker)
        } else {
            let fence_char = self.marker.chars().next().unwrap_or('`');
            let run = rest.len() - rest.trim_start_matches(fence_char).len();
            (run >= self.marker.len()).then(|| &rest[run..])
        };
        rest.is_some_and(|rest| rest.trim_matches([' ', '\t']).is_empty())
    }

    /// Remove this fence's prefix from a body line.
    pub fn strip_prefix<'l>(&self, line: &'l str) -> &'l str {
        line.strip_prefix(self.prefix).unwrap_or(line)
    }
}

/// Parse fence info attributes.
///
/// Format: `language [key | key=value | key="quoted value" ...]`. Bare keys
/// map to an empty value.
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut tokens = tokenize(info).into_iter();
    let language = tokens.next().unwrap_or_default();

    let mut attrs = HashMap::new();
    for token in tokens {
        let (key, value) = token.split_once('=').unwrap_or((token.as_str(), ""));
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        attrs.insert(key.to_owned(), value.to_owned());
    }

    (language, attrs)
}

/// Split on whitespace outside double quotes.
fn tokenize(info: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in info.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fence_open() {
        let fence = FenceOpen::parse(r#"> ````typst-preview vertical lang="typst""#).unwrap();
        assert_eq!(fence.prefix, "> ");
        assert_eq!(fence.marker, "````");
        assert_eq!(fence.info, r#"typst-preview vertical lang="typst""#);
        assert!(fence.is_preview());
    }

    #[test]
    fn test_non_preview_fences() {
        assert!(!FenceOpen::parse("```typst").unwrap().is_preview());
        assert!(!FenceOpen::parse("```").unwrap().is_preview());
        assert!(!FenceOpen::parse("```typst-preview-x").unwrap().is_preview());
        assert_eq!(FenceOpen::parse("``typst-preview"), None);
        assert_eq!(FenceOpen::parse("``` a`b"), None);
        assert_eq!(FenceOpen::parse("text"), None);
    }

    #[test]
    fn test_preview_terminator_exact() {
        let fence = FenceOpen::parse("> ~~~typst-preview").unwrap();
        assert!(fence.is_terminator("> ~~~"));
        assert!(fence.is_terminator("> ~~~ \t"));
        assert!(!fence.is_terminator("~~~"));
        assert!(!fence.is_terminator("> ~~~~"));
        assert!(!fence.is_terminator("> ```"));
    }

    #[test]
    fn test_regular_terminator_accepts_longer_run() {
        let fence = FenceOpen::parse("```rust").unwrap();
        assert!(fence.is_terminator("```"));
        assert!(fence.is_terminator("`````  "));
        assert!(!fence.is_terminator("``"));
        assert!(!fence.is_terminator("~~~"));
        assert!(!fence.is_terminator("```` x"));

        let fence = FenceOpen::parse("> ~~~~").unwrap();
        assert!(fence.is_terminator("> ~~~~~"));
        assert!(!fence.is_terminator("> ~~~"));
    }

    #[test]
    fn test_strip_prefix() {
        let fence = FenceOpen::parse("> ```typst-preview").unwrap();
        assert_eq!(fence.strip_prefix("> = Hi"), "= Hi");
        assert_eq!(fence.strip_prefix(">"), ">");
    }

    #[test]
    fn test_parse_fence_info() {
        let (lang, attrs) =
            parse_fence_info(r#"typst-preview fake mode=code title="Two words" lang="typst-code""#);
        assert_eq!(lang, "typst-preview");
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs["fake"], "");
        assert_eq!(attrs["mode"], "code");
        assert_eq!(attrs["title"], "Two words");
        assert_eq!(attrs["lang"], "typst-code");
    }

    #[test]
    fn test_parse_fence_info_language_only() {
        let (lang, attrs) = parse_fence_info("typst-preview");
        assert_eq!(lang, "typst-preview");
        assert!(attrs.is_empty());
    }
}
