//! Typst preview rendering.
//!
//! Turns the source of a `typst-preview` fence into a pair of SVG images
//! (light and dark) and returns the markup referencing them:
//! - [`RenderMode`] and [`Templates`]: wrap user source into a full document
//! - [`RenderCache`]: content-addressed artifacts keyed by [`fingerprint`]
//! - [`Compiler`]: the external compiler, [`ProcessCompiler`] by default
//! - [`PreviewFormatter`]: validates fence attributes, consults the cache and
//!   reports every failure as a single [`FenceError`]
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::path::Path;
//! use std::sync::Arc;
//! use tpv_render::{PreviewFormatter, ProcessCompiler, RenderCache};
//!
//! let cache = RenderCache::new(Path::new("docs"), Path::new("site"));
//! let formatter = PreviewFormatter::new(cache, Arc::new(ProcessCompiler::typst()))
//!     .with_site_path(Some("/".to_owned()));
//!
//! let attrs = HashMap::from([("lang".to_owned(), "typst".to_owned())]);
//! let html = formatter.format("= Hello", &attrs).unwrap();
//! assert!(html.starts_with("<img src=\"/rendered/"));
//! ```

mod cache;
mod compiler;
mod error;
mod formatter;
mod mode;
mod template;

pub use cache::{RENDERED_DIR, RenderCache, Variant, fingerprint};
pub use compiler::{Compiler, ProcessCompiler};
pub use error::{CompileError, FenceError, PreviewError};
pub use formatter::{PreviewFormatter, PreviewOptions, RenderedPreview, escape_html, strip_imports};
pub use mode::RenderMode;
pub use template::{DEFAULT_IMPORTS, DEFAULT_LEGACY_IMPORTS, Templates};
