//! `tpv scan` command implementation.

use std::path::PathBuf;

use clap::Args;
use tpv_scanner::PreviewScanner;

use super::{input_name, log_warnings, read_input};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the scan command.
#[derive(Args)]
pub(crate) struct ScanArgs {
    /// Markdown file to scan (default: stdin).
    file: Option<PathBuf>,
}

impl ScanArgs {
    /// Run the scanner only and print the intermediate markdown to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or a preview fence is unterminated.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let input = read_input(self.file.as_deref())?;

        let mut scanner = PreviewScanner::new();
        let scanned = scanner.scan(&input)?;
        log_warnings(&input_name(self.file.as_deref()), scanner.warnings());

        output.document(&scanned)?;
        Ok(())
    }
}
