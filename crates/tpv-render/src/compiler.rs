//! External compiler invocation.
//!
//! The compiler is a black box: document text goes in on stdin, an SVG comes
//! out at the path given as last argument. Output is first written to a hidden
//! temporary file next to the destination and renamed into place only after a
//! successful exit, so a failed or interrupted run never leaves a file at the
//! destination path.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::CompileError;

/// Compiles a document into an image file.
pub trait Compiler: Send + Sync {
    /// Compile `document` and write the image to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if the document cannot be compiled.
    fn compile(&self, document: &str, output: &Path) -> Result<(), CompileError>;
}

/// Runs an external program: `<program> <args...> <output>` with the document on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCompiler {
    program: String,
    args: Vec<String>,
}

impl ProcessCompiler {
    /// Create a compiler invoking `program` with `args` before the output path.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The `typst c - <output>` invocation.
    #[must_use]
    pub fn typst() -> Self {
        Self::new("typst", vec!["c".to_owned(), "-".to_owned()])
    }
}

impl Default for ProcessCompiler {
    fn default() -> Self {
        Self::typst()
    }
}

impl Compiler for ProcessCompiler {
    fn compile(&self, document: &str, output: &Path) -> Result<(), CompileError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CompileError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a chatty compiler cannot
        // deadlock on a full stdout/stderr pipe.
        let stdin = child.stdin.take();
        let result = std::thread::scope(|s| {
            let writer = s.spawn(move || -> io::Result<()> {
                if let Some(mut stdin) = stdin {
                    stdin.write_all(document.as_bytes())?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            (output, join_writer(writer))
        });
        let out = result.0?;

        if !out.status.success() {
            let stdout = String::from_utf8_lossy(&out.stdout);
            let stderr = String::from_utf8_lossy(&out.stderr);
            tracing::error!(
                program = %self.program,
                status = %out.status,
                %stdout,
                %stderr,
                "compiler failed, attempted document:\n{document}"
            );
            return Err(CompileError::Failed {
                status: out.status.to_string(),
                stderr: stderr.trim().to_owned(),
            });
        }

        // A compiler that exits early without reading stdin has still failed
        // to see the whole document.
        result.1?;
        Ok(())
    }
}

/// Wait for the stdin writer, re-raising its panic on this thread.
fn join_writer(writer: std::thread::ScopedJoinHandle<'_, io::Result<()>>) -> io::Result<()> {
    writer
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Compile `document` to `dest` through a temporary file in the same directory.
///
/// `dest` only appears once the compiler has succeeded.
///
/// # Errors
///
/// Returns [`CompileError`] if compilation or the final rename fails.
pub(crate) fn compile_atomic(
    compiler: &dyn Compiler,
    document: &str,
    dest: &Path,
) -> Result<(), CompileError> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".svg")
        .tempfile_in(dir)?
        .into_temp_path();

    compiler.compile(document, &temp)?;
    make_world_readable(&temp)?;
    temp.persist(dest).map_err(|e| CompileError::Io(e.error))?;
    Ok(())
}

/// Give an artifact the usual `0644` mode.
///
/// Temporary files are created owner-only, which a web server running as
/// another user cannot serve.
#[cfg(unix)]
pub(crate) fn make_world_readable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
pub(crate) fn make_world_readable(_path: &Path) -> io::Result<()> {
    Ok(())
}
