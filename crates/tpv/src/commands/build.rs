//! `tpv build` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{ConfigArgs, log_warnings, pipeline_from_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Output directory for processed documents (default: .tpv/build/).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

impl BuildArgs {
    /// Process every document below the docs directory.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the docs tree cannot be
    /// listed, or any document fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;
        let docs = &config.docs_resolved;

        let output_dir = self.output_dir.unwrap_or_else(|| docs.build_dir());

        output.info(&format!("Docs: {}", docs.docs_dir.display()));
        output.info(&format!("Output: {}", output_dir.display()));

        let pipeline = pipeline_from_config(&config);
        let report = pipeline.process_tree(&docs.docs_dir, &output_dir)?;

        for (path, doc) in &report.processed {
            log_warnings(&path.display().to_string(), &doc.warnings);
        }
        for (path, err) in &report.failures {
            output.error(&format!("{}: {err}", path.display()));
        }

        let total = report.processed.len() + report.failures.len();
        if !report.failures.is_empty() {
            return Err(CliError::Build {
                failed: report.failures.len(),
                total,
            });
        }

        output.success(&format!(
            "Processed {total} documents, {} previews ({} compiled)",
            report.previews(),
            report.compiled()
        ));
        Ok(())
    }
}
