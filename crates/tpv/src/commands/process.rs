//! `tpv process` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{ConfigArgs, input_name, log_warnings, pipeline_from_config, read_input};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the process command.
#[derive(Args)]
pub(crate) struct ProcessArgs {
    /// Markdown file to process (default: stdin).
    file: Option<PathBuf>,

    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

impl ProcessArgs {
    /// Run the full pipeline on a single document.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read, or
    /// a preview fails to render.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;
        let pipeline = pipeline_from_config(&config);

        let input = read_input(self.file.as_deref())?;
        let doc = pipeline.process(&input)?;
        log_warnings(&input_name(self.file.as_deref()), &doc.warnings);

        match self.output {
            Some(path) => {
                std::fs::write(&path, &doc.output)?;
                output.success(&format!(
                    "Processed {} previews ({} compiled) to {}",
                    doc.previews,
                    doc.compiled,
                    path.display()
                ));
            }
            None => output.document(&doc.output)?,
        }
        Ok(())
    }
}
