//! Preview formatter: turns a `typst-preview` fence into image markup.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::cache::{RENDERED_DIR, RenderCache, Variant, fingerprint};
use crate::compiler::Compiler;
use crate::error::{FenceError, PreviewError};
use crate::mode::RenderMode;
use crate::template::Templates;

static IMPORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#import.*(?:\r?\n)?").unwrap());

/// Validated fence attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    pub mode: RenderMode,
    /// Drop `#import` lines from the source; the template supplies them.
    pub fake: bool,
}

impl PreviewOptions {
    /// Validate fence attributes.
    ///
    /// An explicit `mode` wins. Otherwise the mode follows `lang`, and
    /// defaults to `embedded` when there is no `lang` either.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError`] for an empty or unknown `mode`, or a `lang`
    /// that maps to no mode.
    pub fn from_attrs(attrs: &HashMap<String, String>) -> Result<Self, PreviewError> {
        let mode = if let Some(mode) = attrs.get("mode") {
            if mode.is_empty() {
                return Err(PreviewError::MissingMode);
            }
            RenderMode::parse(mode).ok_or_else(|| PreviewError::UnknownMode(mode.clone()))?
        } else if let Some(lang) = attrs.get("lang") {
            RenderMode::from_language(lang)
                .ok_or_else(|| PreviewError::UnknownLanguage(lang.clone()))?
        } else {
            RenderMode::Embedded
        };

        Ok(Self {
            mode,
            fake: attrs.contains_key("fake"),
        })
    }
}

/// Remove every line starting with `#import`.
#[must_use]
pub fn strip_imports(source: &str) -> String {
    IMPORT_LINE.replace_all(source, "").into_owned()
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// A preview whose artifacts are in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPreview {
    pub fingerprint: String,
    pub light_url: String,
    pub dark_url: String,
    /// Whether the compiler ran (false on a cache hit).
    pub compiled: bool,
}

impl RenderedPreview {
    /// Image markup for both variants.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            r#"<img src="{}" alt="Preview" loading="lazy"><img src="{}" alt="Preview" loading="lazy">"#,
            escape_html(&self.light_url),
            escape_html(&self.dark_url)
        )
    }
}

/// Renders preview fences through the cache, compiling on a miss.
///
/// Shareable across threads; independent previews may be formatted in parallel.
pub struct PreviewFormatter {
    templates: Templates,
    cache: RenderCache,
    compiler: Arc<dyn Compiler>,
    /// URL path prefix of the site, ending with `/`.
    site_path: Option<String>,
}

impl PreviewFormatter {
    /// Create a formatter with default templates and no site path.
    #[must_use]
    pub fn new(cache: RenderCache, compiler: Arc<dyn Compiler>) -> Self {
        Self {
            templates: Templates::default(),
            cache,
            compiler,
            site_path: None,
        }
    }

    /// Use custom templates.
    #[must_use]
    pub fn with_templates(mut self, templates: Templates) -> Self {
        self.templates = templates;
        self
    }

    /// Set the URL path prefix used in image links (must end with `/`).
    #[must_use]
    pub fn with_site_path(mut self, site_path: Option<String>) -> Self {
        self.site_path = site_path;
        self
    }

    /// Format a preview fence into image markup.
    ///
    /// # Errors
    ///
    /// Any failure is returned as a [`FenceError`].
    pub fn format(
        &self,
        source: &str,
        attrs: &HashMap<String, String>,
    ) -> Result<String, FenceError> {
        Ok(self.render(source, attrs)?.to_html())
    }

    /// Render a preview fence, compiling both variants unless cached.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError`] for invalid attributes, a missing site path,
    /// compiler failures and I/O errors.
    pub fn render(
        &self,
        source: &str,
        attrs: &HashMap<String, String>,
    ) -> Result<RenderedPreview, PreviewError> {
        let options = PreviewOptions::from_attrs(attrs)?;
        let site_path = self
            .site_path
            .as_deref()
            .ok_or(PreviewError::MissingConfig("site_url"))?;

        let source = if options.fake {
            strip_imports(source)
        } else {
            source.to_owned()
        };
        let light = self.templates.render(options.mode, false, &source);
        let dark = self.templates.render(options.mode, true, &source);
        let fp = fingerprint(&light);

        let compiled = if self.cache.is_cached(&fp) {
            tracing::debug!(fingerprint = %fp, "preview cache hit");
            false
        } else {
            tracing::info!(fingerprint = %fp, mode = %options.mode, "rendering preview");
            self.cache
                .store(self.compiler.as_ref(), &fp, [light.as_str(), dark.as_str()])?;
            true
        };
        self.cache.publish(&fp)?;

        let url =
            |variant: Variant| format!("{site_path}{RENDERED_DIR}/{}", variant.file_name(&fp));
        Ok(RenderedPreview {
            light_url: url(Variant::Light),
            dark_url: url(Variant::Dark),
            fingerprint: fp,
            compiled,
        })
    }
}
