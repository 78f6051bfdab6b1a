//! `+preview(...)` option parsing.
//!
//! Options are separated by commas and/or whitespace. Double-quoted values
//! keep their separators:
//!
//! ```text
//! +preview(vertical, mode=code title="Two words")
//! ```
//!
//! The `vertical` and `01-to-02` tokens are scanner flags; everything else is
//! forwarded untouched to the nested preview fence.

/// Language tag selected by the `01-to-02` flag.
pub const LEGACY_LANGUAGE: &str = "typst-01-to-02";

/// Parsed `+preview(...)` options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Lay source and preview out vertically.
    pub vertical: bool,
    /// Render against both the 0.1 and 0.2 package versions.
    pub legacy: bool,
    /// Remaining tokens, in source order.
    pub passthrough: Vec<String>,
}

impl PreviewOptions {
    /// Parse the text between the directive's parentheses.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut options = Self::default();
        for token in tokenize(text) {
            match token.as_str() {
                "vertical" => options.vertical = true,
                "01-to-02" => options.legacy = true,
                _ => options.passthrough.push(token),
            }
        }
        options
    }

    /// Effective language tag for a fence opened with `language`.
    #[must_use]
    pub fn effective_language<'a>(&self, language: &'a str) -> &'a str {
        if self.legacy { LEGACY_LANGUAGE } else { language }
    }

    /// Attribute string for the nested preview fence: passthrough tokens plus `lang="<tag>"`.
    #[must_use]
    pub fn attributes(&self, language: &str) -> String {
        let lang = format!(r#"lang="{language}""#);
        if self.passthrough.is_empty() {
            lang
        } else {
            format!("{} {lang}", self.passthrough.join(" "))
        }
    }

    /// CSS classes for the outer preview wrapper.
    #[must_use]
    pub fn wrapper_classes(&self) -> &'static str {
        if self.vertical {
            "typst-preview vertical"
        } else {
            "typst-preview"
        }
    }
}

/// Split option text on commas and whitespace outside double quotes.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in text.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' | ' ' | '\t' if !quoted => {
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
