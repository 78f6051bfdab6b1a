//! Render modes selecting the template that wraps user source.

use std::fmt;

/// Template selector for a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Source is a code block: wrapped in `#{ ... }`.
    Code,
    /// Source is markup, rendered with the current package imports.
    Embedded,
    /// Source is markup, rendered with both the 0.1 and 0.2 package imports.
    Legacy01To02,
    /// Source is markup, rendered without any imports.
    Basic,
}

impl RenderMode {
    /// Parse an explicit `mode=` value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "code" => Some(Self::Code),
            "embedded" => Some(Self::Embedded),
            "01-to-02" => Some(Self::Legacy01To02),
            "basic" => Some(Self::Basic),
            _ => None,
        }
    }

    /// Infer the mode from a fence language tag.
    #[must_use]
    pub fn from_language(lang: &str) -> Option<Self> {
        match lang {
            "typst-code" => Some(Self::Code),
            "typst" => Some(Self::Embedded),
            "typst-01-to-02" => Some(Self::Legacy01To02),
            _ => None,
        }
    }

    /// Name as written in `mode=` attributes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Embedded => "embedded",
            Self::Legacy01To02 => "01-to-02",
            Self::Basic => "basic",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
