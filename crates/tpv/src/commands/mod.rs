//! CLI command implementations.

mod build;
mod process;
mod scan;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use tpv_config::{CliSettings, Config};
use tpv_pipeline::Pipeline;
use tpv_render::{PreviewFormatter, ProcessCompiler, RenderCache, Templates};

use crate::error::CliError;

pub(crate) use build::BuildArgs;
pub(crate) use process::ProcessArgs;
pub(crate) use scan::ScanArgs;

/// Configuration options shared by commands that render previews.
#[derive(Args, Debug, Default)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover tpv.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Documentation source directory (overrides config).
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    /// Published site directory (overrides config).
    #[arg(long)]
    site_dir: Option<PathBuf>,

    /// Public site URL used in image links (overrides config).
    #[arg(long, env = "TPV_SITE_URL")]
    site_url: Option<String>,

    /// Compiler program (overrides config).
    #[arg(long)]
    compiler: Option<String>,
}

impl ConfigArgs {
    /// Load configuration with these arguments applied.
    pub(crate) fn load(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            docs_dir: self.docs_dir.clone(),
            site_dir: self.site_dir.clone(),
            site_url: self.site_url.clone(),
            compiler: self.compiler.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Build the preview pipeline described by `config`.
pub(crate) fn pipeline_from_config(config: &Config) -> Pipeline {
    let docs = &config.docs_resolved;

    let mut templates = Templates::new();
    if let Some(imports) = &config.preview.imports {
        templates = templates.with_imports(imports.as_str());
    }
    if let Some(imports) = &config.preview.legacy_imports {
        templates = templates.with_legacy_imports(imports.as_str());
    }

    let compiler = ProcessCompiler::new(
        config.compiler.program.as_str(),
        config.compiler.args.clone(),
    );
    let formatter = PreviewFormatter::new(
        RenderCache::new(&docs.docs_dir, &docs.site_dir),
        Arc::new(compiler),
    )
    .with_templates(templates)
    .with_site_path(docs.site_path());

    Pipeline::new(formatter)
}

/// Read a document from `path`, or stdin when no path is given.
pub(crate) fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Log the warnings collected while processing `source`.
pub(crate) fn log_warnings(source: &str, warnings: &[String]) {
    for warning in warnings {
        tracing::warn!(path = %source, warning = %warning, "Document warning");
    }
}

/// Display name of an input for messages.
pub(crate) fn input_name(path: Option<&Path>) -> String {
    path.map_or_else(|| "<stdin>".to_owned(), |p| p.display().to_string())
}
