//! CLI error types.

use tpv_config::ConfigError;
use tpv_pipeline::PipelineError;
use tpv_scanner::ScanError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Scan(#[from] ScanError),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("{failed} of {total} documents failed")]
    Build { failed: usize, total: usize },
}
