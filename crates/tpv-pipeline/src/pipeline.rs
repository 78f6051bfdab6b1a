//! Document processing: scanner pass followed by the preview pass.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tpv_render::{FenceError, PreviewFormatter};
use tpv_scanner::{PreviewScanner, ScanError};

use crate::fence::{FenceOpen, parse_fence_info};

/// Error returned when a document cannot be processed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// A preview fence failed to render.
    #[error("line {line}: {source}")]
    Fence {
        /// Line of the nested preview fence in the scanned document (1-indexed).
        line: usize,
        #[source]
        source: FenceError,
    },
    /// A preview fence sits inside another code block and would be published raw.
    #[error("line {line}: preview fence inside a code block cannot be rendered")]
    UnrenderedPreview {
        /// Line of the nested preview fence in the scanned document (1-indexed).
        line: usize,
    },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl PipelineError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of processing one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessedDocument {
    /// Markdown with previews replaced by image markup.
    pub output: String,
    /// Non-fatal warnings from scanning.
    pub warnings: Vec<String>,
    /// Number of previews in the document.
    pub previews: usize,
    /// Number of previews that had to be compiled (cache misses).
    pub compiled: usize,
}

/// Outcome of processing a docs tree.
#[derive(Debug, Default)]
pub struct TreeReport {
    /// Output files written, with their processing results.
    pub processed: Vec<(PathBuf, ProcessedDocument)>,
    /// Source files that failed.
    pub failures: Vec<(PathBuf, PipelineError)>,
}

impl TreeReport {
    /// Total previews across processed documents.
    #[must_use]
    pub fn previews(&self) -> usize {
        self.processed.iter().map(|(_, doc)| doc.previews).sum()
    }

    /// Total compiled previews across processed documents.
    #[must_use]
    pub fn compiled(&self) -> usize {
        self.processed.iter().map(|(_, doc)| doc.compiled).sum()
    }
}

/// Preprocessing pipeline for markdown documents.
pub struct Pipeline {
    formatter: PreviewFormatter,
}

impl Pipeline {
    /// Create a pipeline rendering previews with `formatter`.
    #[must_use]
    pub fn new(formatter: PreviewFormatter) -> Self {
        Self { formatter }
    }

    /// Process one markdown document.
    ///
    /// A trailing newline in `input` is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Scan`] for malformed preview fences,
    /// [`PipelineError::Fence`] for the first preview that fails to render and
    /// [`PipelineError::UnrenderedPreview`] for a preview enclosed in another
    /// code block.
    pub fn process(&self, input: &str) -> Result<ProcessedDocument, PipelineError> {
        let mut scanner = PreviewScanner::new();
        let lines: Vec<&str> = input.lines().collect();
        let scanned = scanner.scan_lines(&lines)?;

        let mut doc = ProcessedDocument {
            warnings: scanner.warnings().to_vec(),
            ..ProcessedDocument::default()
        };
        let mut out: Vec<String> = Vec::with_capacity(scanned.len());
        let mut i = 0;
        while i < scanned.len() {
            let line = scanned[i].as_str();
            let Some(fence) = FenceOpen::parse(line) else {
                out.push(line.to_owned());
                i += 1;
                continue;
            };
            let Some(end) = (i + 1..scanned.len()).find(|&k| fence.is_terminator(&scanned[k]))
            else {
                // Unclosed fences run to the end of the document.
                reject_previews(&scanned[i..], i + 1)?;
                out.extend(scanned[i..].iter().cloned());
                break;
            };

            if fence.is_preview() {
                let (_, attrs) = parse_fence_info(fence.info);
                let source = scanned[i + 1..end]
                    .iter()
                    .map(|l| fence.strip_prefix(l))
                    .collect::<Vec<_>>()
                    .join("\n");
                let rendered = self
                    .formatter
                    .render(&source, &attrs)
                    .map_err(|e| PipelineError::Fence {
                        line: i + 1,
                        source: FenceError::from(e),
                    })?;
                out.push(format!("{}{}", fence.prefix, rendered.to_html()));
                doc.previews += 1;
                doc.compiled += usize::from(rendered.compiled);
            } else {
                reject_previews(&scanned[i + 1..end], i + 2)?;
                out.extend(scanned[i..=end].iter().cloned());
            }
            i = end + 1;
        }

        doc.output = out.join("\n");
        if input.ends_with('\n') {
            doc.output.push('\n');
        }
        Ok(doc)
    }

    /// Process a markdown file into `output`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if reading, processing or writing fails.
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<ProcessedDocument, PipelineError> {
        let text = fs::read_to_string(input).map_err(|e| PipelineError::io(input, e))?;
        let doc = self.process(&text)?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        fs::write(output, &doc.output).map_err(|e| PipelineError::io(output, e))?;
        tracing::debug!(
            input = %input.display(),
            previews = doc.previews,
            compiled = doc.compiled,
            "processed document"
        );
        Ok(doc)
    }

    /// Process every `*.md` file below `docs_dir` into the mirrored path below `out_dir`.
    ///
    /// Documents are processed in parallel. A failing document does not stop
    /// the others; failures are collected in the report.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] only if the docs tree cannot be listed.
    pub fn process_tree(
        &self,
        docs_dir: &Path,
        out_dir: &Path,
    ) -> Result<TreeReport, PipelineError> {
        let files = markdown_files(docs_dir)?;
        tracing::info!(count = files.len(), docs_dir = %docs_dir.display(), "processing documents");

        let results: Vec<(PathBuf, Result<(PathBuf, ProcessedDocument), PipelineError>)> = files
            .par_iter()
            .map(|path| {
                let relative = path.strip_prefix(docs_dir).unwrap_or(path);
                let target = out_dir.join(relative);
                let result = self.process_file(path, &target).map(|doc| (target, doc));
                (path.clone(), result)
            })
            .collect();

        let mut report = TreeReport::default();
        for (path, result) in results {
            match result {
                Ok(done) => report.processed.push(done),
                Err(e) => {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "failed to process document"
                    );
                    report.failures.push((path, e));
                }
            }
        }
        Ok(report)
    }
}

/// Fail on the first preview fence among lines copied verbatim.
///
/// `first_line` is the 1-indexed line number of `lines[0]`.
fn reject_previews(lines: &[String], first_line: usize) -> Result<(), PipelineError> {
    match lines
        .iter()
        .position(|line| FenceOpen::parse(line).is_some_and(|fence| fence.is_preview()))
    {
        Some(k) => Err(PipelineError::UnrenderedPreview {
            line: first_line + k,
        }),
        None => Ok(()),
    }
}

/// List markdown files below `dir`, sorted.
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let pattern = format!(
        "{}/**/*.md",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            PipelineError::io(&path, e.into_error())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use tpv_render::{CompileError, Compiler, PreviewError, RenderCache};

    #[derive(Default)]
    struct RecordingCompiler {
        documents: Mutex<Vec<String>>,
    }

    impl Compiler for RecordingCompiler {
        fn compile(&self, document: &str, output: &Path) -> Result<(), CompileError> {
            self.documents.lock().unwrap().push(document.to_owned());
            fs::write(output, "<svg/>")?;
            Ok(())
        }
    }

    fn pipeline(dir: &Path, compiler: Arc<impl Compiler + 'static>) -> Pipeline {
        let cache = RenderCache::new(&dir.join("docs"), &dir.join("site"));
        let formatter = PreviewFormatter::new(cache, compiler).with_site_path(Some("/".to_owned()));
        Pipeline::new(formatter)
    }

    #[test]
    fn test_plain_document_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), Arc::new(RecordingCompiler::default()));
        let input = "# Title\n\n```rust\nfn main() {}\n```\n\nText }\n";

        let doc = pipeline.process(input).unwrap();

        assert_eq!(doc.output, input);
        assert_eq!(doc.previews, 0);
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_preview_replaced_with_images() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = Arc::new(RecordingCompiler::default());
        let pipeline = pipeline(dir.path(), Arc::clone(&compiler));
        let input = "Intro\n\n```typst +preview(vertical)\n= Hello\n```\n1. Heading\n\nAfter\n";

        let doc = pipeline.process(input).unwrap();

        assert_eq!(doc.previews, 1);
        assert_eq!(doc.compiled, 1);
        let lines: Vec<&str> = doc.output.lines().collect();
        assert_eq!(
            &lines[..8],
            &[
                "Intro",
                "",
                r#"<div class="typst-preview vertical" markdown="1"><div class="typst-source" markdown="1">"#,
                "```typst ",
                "= Hello",
                "```",
                "1. Heading",
                "",
            ]
        );
        assert_eq!(lines[8], r#"</div><div class="preview">"#);
        assert!(lines[9].starts_with(r#"<img src="/rendered/"#));
        assert_eq!(&lines[10..], &["</div></div>", "", "After"]);
        assert!(doc.output.ends_with('\n'));

        let documents = compiler.documents.lock().unwrap();
        assert_eq!(documents.len(), 2);
        assert!(documents[0].ends_with("as icu\n= Hello"));
    }

    #[test]
    fn test_code_mode_from_language() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = Arc::new(RecordingCompiler::default());
        let pipeline = pipeline(dir.path(), Arc::clone(&compiler));

        pipeline
            .process("```typst-code +preview\nicu.fmt(d)\n```\n")
            .unwrap();

        let documents = compiler.documents.lock().unwrap();
        assert!(documents[0].contains("#{\n        icu.fmt(d)\n    }"));
    }

    #[test]
    fn test_blockquote_preview_source_unprefixed() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = Arc::new(RecordingCompiler::default());
        let pipeline = pipeline(dir.path(), Arc::clone(&compiler));

        let doc = pipeline
            .process("> ```typst +preview(mode=basic)\n> = Quoted\n> ```\n")
            .unwrap();

        assert!(doc.output.contains("\n> <img src="));
        let documents = compiler.documents.lock().unwrap();
        assert!(documents[0].ends_with("\n\n= Quoted"));
        assert!(!documents[0].contains("#import"));
    }

    #[test]
    fn test_repeated_preview_compiled_once() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = Arc::new(RecordingCompiler::default());
        let pipeline = pipeline(dir.path(), Arc::clone(&compiler));
        let input = "```typst +preview\nx\n```\n\n```typst +preview\nx\n```\n";

        let doc = pipeline.process(input).unwrap();

        assert_eq!(doc.previews, 2);
        assert_eq!(doc.compiled, 1);
        assert_eq!(compiler.documents.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_preview_inside_example() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), Arc::new(RecordingCompiler::default()));

        let doc = pipeline
            .process("example(Dates){\n```typst +preview\nx\n```\n}\n")
            .unwrap();

        let lines: Vec<&str> = doc.output.lines().collect();
        assert_eq!(
            lines[0],
            r#"<details class="example" markdown="1"><summary>Dates</summary>"#
        );
        assert_eq!(lines.last(), Some(&"</details>"));
    }

    #[test]
    fn test_unterminated_fence_is_scan_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), Arc::new(RecordingCompiler::default()));

        let err = pipeline.process("```typst +preview\nx\n").unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Scan(ScanError::UnterminatedFence { line: 1, .. })
        ));
    }

    #[test]
    fn test_longer_closing_run_ends_code_block() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), Arc::new(RecordingCompiler::default()));

        let doc = pipeline
            .process("```\ncode\n````\n\n~~~typst +preview\nx\n~~~\n")
            .unwrap();

        assert_eq!(doc.previews, 1);
        assert!(doc.output.starts_with("```\ncode\n````\n\n<div"));
        assert!(!doc.output.contains("typst-preview lang"));
    }

    #[test]
    fn test_preview_inside_code_block_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = Arc::new(RecordingCompiler::default());
        let pipeline = pipeline(dir.path(), Arc::clone(&compiler));

        let err = pipeline
            .process("````markdown\n```typst +preview\nx\n```\n````\n")
            .unwrap_err();

        // Opening fence, wrapper, source fence (3 lines), preview div, nested fence.
        assert!(matches!(err, PipelineError::UnrenderedPreview { line: 7 }));
        assert!(compiler.documents.lock().unwrap().is_empty());
    }

    #[test]
    fn test_preview_after_unclosed_code_block_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), Arc::new(RecordingCompiler::default()));

        let err = pipeline
            .process("~~~~\n~~~typst +preview\nx\n~~~\n")
            .unwrap_err();

        assert!(matches!(err, PipelineError::UnrenderedPreview { line: 7 }));
    }

    #[test]
    fn test_unclosed_example_warned_once() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), Arc::new(RecordingCompiler::default()));

        let doc = pipeline.process("example{\ntext\n").unwrap();

        assert_eq!(
            doc.warnings,
            vec!["line 1: unclosed example (missing closing })".to_owned()]
        );
    }

    #[test]
    fn test_invalid_mode_is_fence_error() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = Arc::new(RecordingCompiler::default());
        let pipeline = pipeline(dir.path(), Arc::clone(&compiler));

        let err = pipeline
            .process("Intro\n```typst +preview(mode=fancy)\nx\n```\n")
            .unwrap_err();

        match err {
            PipelineError::Fence { line, source } => {
                // Wrapper, source fence (3 lines), preview div, nested fence.
                assert_eq!(line, 7);
                assert!(matches!(source.kind(), PreviewError::UnknownMode(m) if m == "fancy"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(compiler.documents.lock().unwrap().is_empty());
    }

    #[test]
    fn test_process_tree() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        let out = dir.path().join("build");
        fs::create_dir_all(docs.join("guide")).unwrap();
        fs::write(docs.join("index.md"), "# Home\n").unwrap();
        fs::write(docs.join("guide/dates.md"), "```typst +preview\nx\n```\n").unwrap();
        fs::write(docs.join("guide/broken.md"), "```typst +preview\nx\n").unwrap();
        fs::write(docs.join("notes.txt"), "ignored").unwrap();
        let pipeline = pipeline(dir.path(), Arc::new(RecordingCompiler::default()));

        let report = pipeline.process_tree(&docs, &out).unwrap();

        assert_eq!(report.processed.len(), 2);
        assert_eq!(report.previews(), 1);
        assert_eq!(report.compiled(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, docs.join("guide/broken.md"));
        assert_eq!(fs::read_to_string(out.join("index.md")).unwrap(), "# Home\n");
        assert!(
            fs::read_to_string(out.join("guide/dates.md"))
                .unwrap()
                .contains("<img src=\"/rendered/")
        );
        assert!(!out.join("guide/broken.md").exists());
        assert!(!out.join("notes.txt").exists());
    }
}
