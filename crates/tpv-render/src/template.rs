//! Document templates wrapping user source before compilation.
//!
//! Every template starts with the same header, which fixes the page to the
//! content size and picks the text color for the light or dark variant.

use crate::mode::RenderMode;

/// Page setup shared by all modes. `{is_dark}` is `true` or `false`.
const HEADER: &str = "
#let _is-dark = {is_dark}
#set page(width: auto, height: auto, margin: 0.75cm, fill: none)
#let _accent = if _is-dark { white } else { black }
#set text(fill: _accent)
#set table(stroke: _accent.transparentize(30%))

";

/// Default package imports for `code` and `embedded` previews.
pub const DEFAULT_IMPORTS: &str = r#"
#import "@local/icu-datetime:0.2.1" as icu
"#;

/// Default package imports for `01-to-02` previews.
pub const DEFAULT_LEGACY_IMPORTS: &str = r#"
#import "@preview/icu-datetime:0.2.0" as icu02
#import "@preview/icu-datetime:0.1.2" as icu01
"#;

/// Fixed template table with configurable import preambles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    imports: String,
    legacy_imports: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            imports: DEFAULT_IMPORTS.to_owned(),
            legacy_imports: DEFAULT_LEGACY_IMPORTS.to_owned(),
        }
    }
}

impl Templates {
    /// Create templates with the default import preambles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the import preamble of `code` and `embedded` previews.
    #[must_use]
    pub fn with_imports(mut self, imports: impl Into<String>) -> Self {
        self.imports = imports.into();
        self
    }

    /// Replace the import preamble of `01-to-02` previews.
    #[must_use]
    pub fn with_legacy_imports(mut self, imports: impl Into<String>) -> Self {
        self.legacy_imports = imports.into();
        self
    }

    /// Build the full document for one variant.
    #[must_use]
    pub fn render(&self, mode: RenderMode, is_dark: bool, source: &str) -> String {
        let mut doc = HEADER.replace("{is_dark}", if is_dark { "true" } else { "false" });
        match mode {
            RenderMode::Code => {
                doc.push_str(&self.imports);
                doc.push_str("\n    #{\n        ");
                doc.push_str(source);
                doc.push_str("\n    }\n    ");
            }
            RenderMode::Embedded => {
                doc.push_str(&self.imports);
                doc.push_str(source);
            }
            RenderMode::Legacy01To02 => {
                doc.push_str(&self.legacy_imports);
                doc.push_str(source);
            }
            RenderMode::Basic => doc.push_str(source),
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_variant_flag() {
        let templates = Templates::new();
        let light = templates.render(RenderMode::Basic, false, "Hi");
        let dark = templates.render(RenderMode::Basic, true, "Hi");

        assert!(light.starts_with("\n#let _is-dark = false\n"));
        assert!(dark.starts_with("\n#let _is-dark = true\n"));
        assert!(light.contains("transparentize(30%)"));
    }

    #[test]
    fn test_basic_has_no_imports() {
        let doc = Templates::new().render(RenderMode::Basic, false, "= Title");
        assert!(!doc.contains("#import"));
        assert!(doc.ends_with("\n\n= Title"));
    }

    #[test]
    fn test_code_wraps_block() {
        let doc = Templates::new().render(RenderMode::Code, false, "icu.fmt(d)");
        assert!(doc.contains(DEFAULT_IMPORTS));
        assert!(doc.ends_with("\n    #{\n        icu.fmt(d)\n    }\n    "));
    }

    #[test]
    fn test_embedded_and_legacy_imports() {
        let templates = Templates::new();
        let embedded = templates.render(RenderMode::Embedded, false, "x");
        let legacy = templates.render(RenderMode::Legacy01To02, false, "x");

        assert!(embedded.contains("as icu\n"));
        assert!(!embedded.contains("icu01"));
        assert!(legacy.contains("as icu02\n"));
        assert!(legacy.contains("as icu01\n"));
        assert!(embedded.ends_with("x"));
    }

    #[test]
    fn test_custom_imports() {
        let templates = Templates::new()
            .with_imports("\n#import \"@preview/pkg:1.0.0\" as pkg\n")
            .with_legacy_imports("\n#import \"@preview/pkg:0.9.0\" as old\n");

        let doc = templates.render(RenderMode::Embedded, true, "x");
        assert_eq!(
            doc.lines().filter(|l| l.starts_with("#import")).collect::<Vec<_>>(),
            vec![r#"#import "@preview/pkg:1.0.0" as pkg"#]
        );
        assert!(
            templates
                .render(RenderMode::Legacy01To02, true, "x")
                .contains("as old")
        );
    }
}
