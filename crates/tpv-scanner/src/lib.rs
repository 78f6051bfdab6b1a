//! Markdown pre-processor for typst preview fences.
//!
//! Rewrites fences tagged `+preview` into a two-panel layout (source on one
//! side, rendered preview on the other) and turns `example{ ... }` blocks
//! into collapsible `<details>` sections. Everything else passes through.
//!
//! The scanner is line-oriented and knows nothing about rendering: it emits a
//! nested `typst-preview` fence that a later stage replaces with images.
//!
//! # Example
//!
//! ```
//! use tpv_scanner::PreviewScanner;
//!
//! let mut scanner = PreviewScanner::new();
//! let output = scanner
//!     .scan("example(Dates){\n```typst-code +preview(vertical)\nicu.fmt(d)\n```\n}\n")
//!     .unwrap();
//!
//! assert!(output.starts_with(r#"<details class="example" markdown="1"><summary>Dates</summary>"#));
//! assert!(output.contains(r#"<div class="typst-preview vertical" markdown="1">"#));
//! assert!(scanner.warnings().is_empty());
//! ```

mod example;
mod fence;
mod options;
mod scanner;

pub use fence::FenceMatch;
pub use options::{LEGACY_LANGUAGE, PreviewOptions};
pub use scanner::{PREVIEW_LANGUAGE, PreviewBlock, PreviewScanner, ScanError};
