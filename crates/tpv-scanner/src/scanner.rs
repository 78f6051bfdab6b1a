//! Preview scanner: rewrites preview fences into source/preview panels.
//!
//! For every `+preview` fence the scanner emits:
//!
//! ````text
//! <div class="typst-preview" markdown="1"><div class="typst-source" markdown="1">
//! ```typst                      <- opening line, directive removed
//! ...source...
//! ```
//! 1. annotation                 <- only when a numbered list follows the fence
//!
//! </div><div class="preview">
//! ```typst-preview lang="typst" <- nested fence picked up by the preview renderer
//! ...source...
//! ```
//! </div></div>
//! ````
//!
//! Every other line passes through unchanged, except example markers.

use crate::example;
use crate::fence::{FenceMatch, is_annotation_item, is_blank};
use crate::options::PreviewOptions;

/// Info-string language of the nested fence handed to the preview renderer.
pub const PREVIEW_LANGUAGE: &str = "typst-preview";

/// Error returned when a document cannot be scanned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// A preview fence was still open at end of input.
    #[error("line {line}: unterminated preview fence (missing closing {marker})")]
    UnterminatedFence {
        /// Line of the opening fence (1-indexed).
        line: usize,
        /// Marker run the fence expects as terminator.
        marker: String,
    },
}

/// A preview fence recognized during scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewBlock {
    /// Line of the opening fence (1-indexed).
    pub line: usize,
    /// Effective language tag (`typst`, `typst-code` or `typst-01-to-02`).
    pub language: String,
    /// Whether the panel is laid out vertically.
    pub vertical: bool,
    /// Attribute string of the nested preview fence.
    pub attrs: String,
    /// Number of annotation lines absorbed after the fence.
    pub annotations: usize,
}

/// A preview fence whose body is being copied.
#[derive(Debug)]
struct OpenPreview {
    fence: FenceMatch,
    block: PreviewBlock,
    /// Body lines including the terminator.
    body: Vec<String>,
}

/// Annotation lines collected after a closed preview fence.
#[derive(Debug)]
struct AnnotationList {
    preview: OpenPreview,
    /// Accepted lines (items and the blank lines between them).
    items: Vec<String>,
    /// Blank lines seen since the last item; kept only if another item follows.
    pending: Vec<String>,
}

/// Scanner state.
#[derive(Debug, Default)]
enum State {
    /// Normal markdown processing.
    #[default]
    Scanning,
    /// Inside a preview fence body.
    InFence(OpenPreview),
    /// After a preview fence, absorbing a trailing numbered list.
    InAnnotationList(AnnotationList),
}

/// Line-oriented scanner for preview fences and example blocks.
///
/// # Example
///
/// ```
/// use tpv_scanner::PreviewScanner;
///
/// let mut scanner = PreviewScanner::new();
/// let output = scanner.scan("```typst +preview\n= Hello\n```\n").unwrap();
///
/// assert!(output.contains(r#"<div class="typst-source" markdown="1">"#));
/// assert!(output.contains(r#"```typst-preview lang="typst""#));
/// assert_eq!(scanner.previews().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct PreviewScanner {
    state: State,
    /// Line of the currently open example block.
    open_example: Option<usize>,
    warnings: Vec<String>,
    previews: Vec<PreviewBlock>,
}

impl PreviewScanner {
    /// Create a new scanner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan markdown text and return the rewritten document.
    ///
    /// A trailing newline in `input` is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::UnterminatedFence`] if a preview fence never closes.
    pub fn scan(&mut self, input: &str) -> Result<String, ScanError> {
        let lines: Vec<&str> = input.lines().collect();
        let mut output = self.scan_lines(&lines)?.join("\n");
        if input.ends_with('\n') {
            output.push('\n');
        }
        Ok(output)
    }

    /// Scan a sequence of lines and return the rewritten sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::UnterminatedFence`] if a preview fence never closes.
    pub fn scan_lines(&mut self, lines: &[&str]) -> Result<Vec<String>, ScanError> {
        let mut out = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            self.feed(line, idx + 1, &mut out);
        }
        self.finish(&mut out)?;
        Ok(out)
    }

    /// Get warnings generated during scanning.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Preview fences recognized so far.
    #[must_use]
    pub fn previews(&self) -> &[PreviewBlock] {
        &self.previews
    }

    /// Consume the scanner and return the recognized preview fences.
    #[must_use]
    pub fn into_previews(self) -> Vec<PreviewBlock> {
        self.previews
    }

    /// Advance the state machine by one line.
    fn feed(&mut self, line: &str, line_num: usize, out: &mut Vec<String>) {
        match std::mem::take(&mut self.state) {
            State::Scanning => self.scan_line(line, line_num, out),
            State::InFence(mut preview) => {
                out.push(line.to_owned());
                preview.body.push(line.to_owned());
                self.state = if preview.fence.is_terminator(line) {
                    State::InAnnotationList(AnnotationList {
                        preview,
                        items: Vec::new(),
                        pending: Vec::new(),
                    })
                } else {
                    State::InFence(preview)
                };
            }
            State::InAnnotationList(mut list) => {
                if is_blank(line) {
                    list.pending.push(line.to_owned());
                    self.state = State::InAnnotationList(list);
                } else if is_annotation_item(line, &list.preview.fence.prefix) {
                    list.items.append(&mut list.pending);
                    list.items.push(line.to_owned());
                    self.state = State::InAnnotationList(list);
                } else {
                    self.close_preview(list, out);
                    self.scan_line(line, line_num, out);
                }
            }
        }
    }

    /// Handle a line outside any preview fence.
    fn scan_line(&mut self, line: &str, line_num: usize, out: &mut Vec<String>) {
        if let Some(fence) = FenceMatch::parse(line) {
            self.open_preview(fence, line, line_num, out);
            return;
        }

        let trimmed = line.trim();
        if let Some(title) = example::parse_start(trimmed) {
            if let Some(open_line) = self.open_example {
                self.warnings.push(format!(
                    "line {line_num}: nested example not supported (example on line {open_line} is still open)"
                ));
            }
            self.open_example = Some(line_num);
            out.push(example::open_tag(title));
        } else if self.open_example.is_some() && example::is_end(trimmed) {
            self.open_example = None;
            out.push(example::CLOSE_TAG.to_owned());
        } else {
            out.push(line.to_owned());
        }
    }

    /// Emit the source panel header and start copying the fence body.
    fn open_preview(
        &mut self,
        fence: FenceMatch,
        line: &str,
        line_num: usize,
        out: &mut Vec<String>,
    ) {
        let options = PreviewOptions::parse(&fence.options);
        let language = options.effective_language(&fence.language).to_owned();
        let attrs = options.attributes(&language);

        out.push(format!(
            r#"{}<div class="{}" markdown="1"><div class="typst-source" markdown="1">"#,
            fence.prefix,
            options.wrapper_classes()
        ));
        // The directive must not reach the source fence's highlighter.
        out.push(line.replace(&fence.directive, ""));

        self.state = State::InFence(OpenPreview {
            block: PreviewBlock {
                line: line_num,
                language,
                vertical: options.vertical,
                attrs,
                annotations: 0,
            },
            fence,
            body: Vec::new(),
        });
    }

    /// Emit annotations, the preview panel and the closing wrappers.
    ///
    /// Blank lines after the last annotation are not part of the panel and are
    /// emitted after it.
    fn close_preview(&mut self, list: AnnotationList, out: &mut Vec<String>) {
        let AnnotationList {
            preview,
            items,
            pending,
        } = list;
        let OpenPreview {
            fence,
            mut block,
            body,
        } = preview;
        let prefix = &fence.prefix;

        if !items.is_empty() {
            block.annotations = items.len();
            out.extend(items);
            out.push(String::new());
        }

        out.push(format!(r#"{prefix}</div><div class="preview">"#));
        out.push(format!(
            "{prefix}{}{PREVIEW_LANGUAGE} {}",
            fence.marker, block.attrs
        ));
        out.extend(body);
        out.push(format!("{prefix}</div></div>"));
        out.extend(pending);

        tracing::debug!(
            line = block.line,
            language = %block.language,
            "rewrote preview fence"
        );
        self.previews.push(block);
    }

    /// Flush state at end of input.
    fn finish(&mut self, out: &mut Vec<String>) -> Result<(), ScanError> {
        if let Some(open_line) = self.open_example.take() {
            self.warnings.push(format!(
                "line {open_line}: unclosed example (missing closing }})"
            ));
        }

        match std::mem::take(&mut self.state) {
            State::Scanning => Ok(()),
            State::InFence(preview) => Err(ScanError::UnterminatedFence {
                line: preview.block.line,
                marker: preview.fence.marker,
            }),
            State::InAnnotationList(list) => {
                self.close_preview(list, out);
                Ok(())
            }
        }
    }
}
