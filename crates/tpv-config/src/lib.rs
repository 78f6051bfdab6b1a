//! Configuration management for tpv.
//!
//! Parses `tpv.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `docs.site_url`
//! - `compiler.program`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docs directory (where rendered previews are dumped).
    pub docs_dir: Option<PathBuf>,
    /// Override site directory (where rendered previews are published).
    pub site_dir: Option<PathBuf>,
    /// Override public site URL.
    pub site_url: Option<String>,
    /// Override compiler program.
    pub compiler: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "tpv.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation configuration (paths are relative strings from TOML).
    #[serde(default)]
    docs: DocsConfigRaw,
    /// External compiler configuration.
    pub compiler: CompilerConfig,
    /// Preview template configuration.
    pub preview: PreviewConfig,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    #[allow(clippy::derivable_impls)]
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw docs configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    docs_dir: Option<String>,
    site_dir: Option<String>,
    site_url: Option<String>,
}

/// Resolved documentation configuration with absolute paths.
#[derive(Debug, Default)]
pub struct DocsConfig {
    /// Markdown source directory. Rendered previews are dumped to `rendered/` below it.
    pub docs_dir: PathBuf,
    /// Published site directory. Rendered previews are copied to `rendered/` below it.
    pub site_dir: PathBuf,
    /// Public URL of the published site.
    pub site_url: Option<String>,
    /// Project directory for tpv data (.tpv/).
    pub project_dir: PathBuf,
}

impl DocsConfig {
    /// URL path of the published site, always ending with `/`.
    ///
    /// Returns `None` when no `site_url` is configured.
    #[must_use]
    pub fn site_path(&self) -> Option<String> {
        self.site_url.as_deref().map(site_path_from_url)
    }

    /// Default output directory for processed documents (.tpv/build/).
    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.project_dir.join("build")
    }
}

/// External compiler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Compiler executable.
    pub program: String,
    /// Arguments placed before the destination path.
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "typst".to_owned(),
            args: vec!["c".to_owned(), "-".to_owned()],
        }
    }
}

/// Preview template configuration.
///
/// Unset fields keep the built-in import preambles.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Import preamble for the `code` and `embedded` modes.
    pub imports: Option<String>,
    /// Import preamble for the `01-to-02` mode.
    pub legacy_imports: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`docs.site_url`").
        field: String,
        /// Error message (e.g., "${`SITE_URL`} not set").
        message: String,
    },
}

/// Extract the path component of a site URL, normalized to end with `/`.
///
/// Query strings and fragments are dropped. A URL without a path maps to `/`.
///
/// ```
/// use tpv_config::site_path_from_url;
///
/// assert_eq!(site_path_from_url("https://example.com/docs"), "/docs/");
/// assert_eq!(site_path_from_url("https://example.com"), "/");
/// ```
#[must_use]
pub fn site_path_from_url(url: &str) -> String {
    let (has_authority, rest) = match url.split_once("://") {
        Some((_, rest)) => (true, rest),
        None => (false, url),
    };
    let rest = rest.split(['?', '#']).next().unwrap_or_default();

    let mut path = if has_authority {
        rest.find('/').map_or("", |start| &rest[start..]).to_owned()
    } else {
        rest.to_owned()
    };

    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to be an http(s) URL or an absolute path.
fn require_site_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http://, https:// or /"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `tpv.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(docs_dir) = &settings.docs_dir {
            self.docs_resolved.docs_dir.clone_from(docs_dir);
        }
        if let Some(site_dir) = &settings.site_dir {
            self.docs_resolved.site_dir.clone_from(site_dir);
        }
        if let Some(site_url) = &settings.site_url {
            self.docs_resolved.site_url = Some(site_url.clone());
        }
        if let Some(compiler) = &settings.compiler {
            self.compiler.program.clone_from(compiler);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfigRaw::default(),
            compiler: CompilerConfig::default(),
            preview: PreviewConfig::default(),
            docs_resolved: DocsConfig {
                docs_dir: base.join("docs"),
                site_dir: base.join("site"),
                site_url: None,
                project_dir: base.join(".tpv"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate the resolved configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.compiler.program, "compiler.program")?;
        if let Some(ref site_url) = self.docs_resolved.site_url {
            require_non_empty(site_url, "docs.site_url")?;
            require_site_url(site_url, "docs.site_url")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.docs.site_url {
            self.docs.site_url = Some(expand::expand_env(url, "docs.site_url")?);
        }
        self.compiler.program = expand::expand_env(&self.compiler.program, "compiler.program")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.docs_resolved = DocsConfig {
            docs_dir: resolve(self.docs.docs_dir.as_deref(), "docs"),
            site_dir: resolve(self.docs.site_dir.as_deref(), "site"),
            site_url: self.docs.site_url.clone(),
            project_dir: config_dir.join(".tpv"),
        };
    }
}
