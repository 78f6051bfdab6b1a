//! Preview preprocessing pipeline.
//!
//! Runs the preview scanner over a markdown document, then replaces every
//! nested `typst-preview` fence it produced with the rendered image markup.
//! The result is plain markdown (with HTML blocks) ready for any converter
//! that understands `markdown="1"`.
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use std::sync::Arc;
//! use tpv_pipeline::Pipeline;
//! use tpv_render::{PreviewFormatter, ProcessCompiler, RenderCache};
//!
//! let cache = RenderCache::new(Path::new("docs"), Path::new("site"));
//! let formatter = PreviewFormatter::new(cache, Arc::new(ProcessCompiler::typst()))
//!     .with_site_path(Some("/".to_owned()));
//! let pipeline = Pipeline::new(formatter);
//!
//! let report = pipeline.process_tree(Path::new("docs"), Path::new(".tpv/build"))?;
//! println!("{} previews", report.previews());
//! # Ok(())
//! # }
//! ```

mod fence;
mod pipeline;

pub use pipeline::{Pipeline, PipelineError, ProcessedDocument, TreeReport};
