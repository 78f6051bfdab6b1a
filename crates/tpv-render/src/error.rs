//! Error types for preview rendering.

use std::io;

/// Failure of the external compiler.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The compiler process could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The compiler exited with a non-zero status.
    #[error("compiler failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },
    /// Temporary output file handling failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Error raised while rendering a single preview.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// `mode` attribute given without a value.
    #[error("missing value for 'mode'")]
    MissingMode,
    /// `mode` attribute names no known template.
    #[error("invalid mode: {0}")]
    UnknownMode(String),
    /// No explicit mode and the language tag maps to no template.
    #[error("invalid language: {0}")]
    UnknownLanguage(String),
    /// A setting required to publish previews is not configured.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The single error surfaced for a preview fence that could not be processed.
///
/// Wraps whatever went wrong inside the formatter.
#[derive(Debug, thiserror::Error)]
#[error("fence processing failed: {source}")]
pub struct FenceError {
    #[from]
    source: PreviewError,
}

impl FenceError {
    /// The underlying preview error.
    #[must_use]
    pub fn kind(&self) -> &PreviewError {
        &self.source
    }
}
