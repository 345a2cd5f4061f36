//! Configuration management for stitch.
//!
//! Parses `stitch.toml` with serde and discovers it in the current directory
//! or any parent. Relative paths are resolved against the directory holding
//! the config file; [`CliSettings`] overrides are applied last.
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` expands to the value of VAR, errors if unset
//! - `${VAR:-default}` expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.base_url`
//! - `site.path_prefix`
//! - `build.checkouts_dir`
//! - `repositories.<name>.path`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "stitch.toml";

/// Repository name used for bare navigation paths when none is configured.
pub const DEFAULT_NARRATIVE_REPOSITORY: &str = "narrative";

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub navigation_file: Option<PathBuf>,
    pub checkouts_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub strict: Option<bool>,
    pub threads: Option<usize>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Publish environment settings.
    pub site: SiteConfig,
    /// Build settings as written in TOML (paths are relative strings).
    build: BuildConfigRaw,
    /// Declared repositories as written in TOML.
    repositories: BTreeMap<String, RepositoryConfigRaw>,

    /// Resolved build settings (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Resolved repositories keyed by name (set after loading).
    #[serde(skip)]
    pub repositories_resolved: BTreeMap<String, RepositoryConfig>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Where the assembled site is published.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute origin, e.g. `https://www.elastic.co`. Without it URLs are
    /// root-relative.
    pub base_url: Option<String>,
    /// Environment path prefix placed before every mount point, e.g. `docs`.
    pub path_prefix: Option<String>,
    /// Repository that owns bare navigation paths.
    pub narrative_repository: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            path_prefix: None,
            narrative_repository: DEFAULT_NARRATIVE_REPOSITORY.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    navigation_file: Option<String>,
    checkouts_dir: Option<String>,
    output_dir: Option<String>,
    strict: Option<bool>,
    threads: Option<usize>,
}

/// Resolved build settings with absolute paths.
#[derive(Debug, Default, Clone)]
pub struct BuildConfig {
    /// Global navigation declaration (`navigation.yml`).
    pub navigation_file: PathBuf,
    /// Directory holding one checkout per repository.
    pub checkouts_dir: PathBuf,
    /// Assembled output directory.
    pub output_dir: PathBuf,
    /// Treat warnings as failures.
    pub strict: bool,
    /// Worker threads for per-set builds; 0 lets rayon decide.
    pub threads: usize,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RepositoryConfigRaw {
    path: Option<String>,
    skip: bool,
}

/// A repository declared in the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Checkout location override; defaults to `checkouts_dir/<name>`.
    pub checkout: Option<PathBuf>,
    /// Exclude the repository from the build while keeping it linkable.
    pub skip: bool,
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
        /// Config field path (e.g., "`site.base_url`").
        field: String,
        /// Error message (e.g., "${`DOCS_HOST`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Repository names double as moniker schemes.
fn require_repository_name(name: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(name, field)?;
    let valid = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(ConfigError::Validation(format!(
            "{field} must be lowercase letters, digits, '-', '_' or '.', got '{name}'"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `stitch.toml` in the current directory and its parents, falling
    /// back to defaults rooted at the current directory.
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
        }

        Ok(config)
    }

    /// Parse configuration from TOML text, resolving paths against `base`.
    pub fn from_toml(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(navigation_file) = &settings.navigation_file {
            self.build_resolved.navigation_file.clone_from(navigation_file);
        }
        if let Some(checkouts_dir) = &settings.checkouts_dir {
            self.build_resolved.checkouts_dir.clone_from(checkouts_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(strict) = settings.strict {
            self.build_resolved.strict = strict;
        }
        if let Some(threads) = settings.threads {
            self.build_resolved.threads = threads;
        }
    }

    /// Names of all declared repositories, skipped ones included.
    pub fn repository_names(&self) -> impl Iterator<Item = &str> {
        self.repositories_resolved.keys().map(String::as_str)
    }

    /// Whether the repository is declared with `skip = true`.
    pub fn is_skipped(&self, name: &str) -> bool {
        self.repositories_resolved
            .get(name)
            .is_some_and(|repo| repo.skip)
    }

    /// Checkout directory for a repository.
    pub fn checkout_dir(&self, name: &str) -> PathBuf {
        self.repositories_resolved
            .get(name)
            .and_then(|repo| repo.checkout.clone())
            .unwrap_or_else(|| self.build_resolved.checkouts_dir.join(name))
    }

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

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            site: SiteConfig::default(),
            build: BuildConfigRaw::default(),
            repositories: BTreeMap::new(),
            build_resolved: BuildConfig::default(),
            repositories_resolved: BTreeMap::new(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MAX_THREADS: usize = 512;

        if let Some(base_url) = &self.site.base_url {
            require_http_url(base_url, "site.base_url")?;
        }
        require_repository_name(&self.site.narrative_repository, "site.narrative_repository")?;
        for name in self.repositories.keys() {
            require_repository_name(name, &format!("repositories.{name}"))?;
        }

        if self.build_resolved.threads > MAX_THREADS {
            return Err(ConfigError::Validation(format!(
                "build.threads cannot exceed {MAX_THREADS}"
            )));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.site.base_url {
            self.site.base_url = Some(expand::expand_env(url, "site.base_url")?);
        }
        if let Some(ref prefix) = self.site.path_prefix {
            self.site.path_prefix = Some(expand::expand_env(prefix, "site.path_prefix")?);
        }
        if let Some(ref dir) = self.build.checkouts_dir {
            self.build.checkouts_dir = Some(expand::expand_env(dir, "build.checkouts_dir")?);
        }
        for (name, repo) in &mut self.repositories {
            if let Some(ref path) = repo.path {
                let field = format!("repositories.{name}.path");
                repo.path = Some(expand::expand_env(path, &field)?);
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.build_resolved = BuildConfig {
            navigation_file: resolve(self.build.navigation_file.as_deref(), "navigation.yml"),
            checkouts_dir: resolve(self.build.checkouts_dir.as_deref(), "checkouts"),
            output_dir: resolve(self.build.output_dir.as_deref(), ".artifacts/assembly"),
            strict: self.build.strict.unwrap_or(false),
            threads: self.build.threads.unwrap_or(0),
        };

        self.repositories_resolved = self
            .repositories
            .iter()
            .map(|(name, raw)| {
                let repo = RepositoryConfig {
                    checkout: raw.path.as_deref().map(|p| config_dir.join(p)),
                    skip: raw.skip,
                };
                (name.clone(), repo)
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/work"));
        assert_eq!(config.site.narrative_repository, "narrative");
        assert_eq!(config.site.base_url, None);
        assert_eq!(
            config.build_resolved.navigation_file,
            PathBuf::from("/work/navigation.yml")
        );
        assert_eq!(
            config.build_resolved.checkouts_dir,
            PathBuf::from("/work/checkouts")
        );
        assert_eq!(
            config.build_resolved.output_dir,
            PathBuf::from("/work/.artifacts/assembly")
        );
        assert!(!config.build_resolved.strict);
        assert_eq!(config.build_resolved.threads, 0);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[site]
base_url = "https://www.elastic.co"
path_prefix = "docs"
narrative_repository = "docs-content"

[build]
navigation_file = "config/navigation.yml"
output_dir = "out"
strict = true
threads = 4

[repositories.elasticsearch]
path = "../elasticsearch"

[repositories.kibana]
skip = true
"#;
        let config = Config::from_toml(toml, Path::new("/work")).unwrap();
        assert_eq!(config.site.base_url.as_deref(), Some("https://www.elastic.co"));
        assert_eq!(config.site.path_prefix.as_deref(), Some("docs"));
        assert_eq!(config.site.narrative_repository, "docs-content");
        assert_eq!(
            config.build_resolved.navigation_file,
            PathBuf::from("/work/config/navigation.yml")
        );
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/work/out"));
        assert!(config.build_resolved.strict);
        assert_eq!(config.build_resolved.threads, 4);
        assert_eq!(
            config.repository_names().collect::<Vec<_>>(),
            vec!["elasticsearch", "kibana"]
        );
        assert!(config.is_skipped("kibana"));
        assert!(!config.is_skipped("elasticsearch"));
    }

    #[test]
    fn test_checkout_dir_override_and_default() {
        let toml = r#"
[repositories.elasticsearch]
path = "../es"

[repositories.kibana]
"#;
        let config = Config::from_toml(toml, Path::new("/work")).unwrap();
        assert_eq!(
            config.checkout_dir("elasticsearch"),
            PathBuf::from("/work/../es")
        );
        assert_eq!(
            config.checkout_dir("kibana"),
            PathBuf::from("/work/checkouts/kibana")
        );
        assert_eq!(
            config.checkout_dir("undeclared"),
            PathBuf::from("/work/checkouts/undeclared")
        );
    }

    #[test]
    fn test_base_url_requires_http_scheme() {
        let toml = r#"
[site]
base_url = "ftp://example.com"
"#;
        let err = Config::from_toml(toml, Path::new("/work")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("site.base_url"));
    }

    #[test]
    fn test_repository_name_must_be_scheme_safe() {
        let toml = r#"
[repositories."Elastic Search"]
"#;
        let err = Config::from_toml(toml, Path::new("/work")).unwrap_err();
        assert!(err.to_string().contains("Elastic Search"));
    }

    #[test]
    fn test_empty_narrative_repository_rejected() {
        let toml = r#"
[site]
narrative_repository = ""
"#;
        let err = Config::from_toml(toml, Path::new("/work")).unwrap_err();
        assert!(err.to_string().contains("site.narrative_repository cannot be empty"));
    }

    #[test]
    fn test_too_many_threads_rejected() {
        let toml = r"
[build]
threads = 100000
";
        let err = Config::from_toml(toml, Path::new("/work")).unwrap_err();
        assert!(err.to_string().contains("build.threads"));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::from_toml("[site\nbase_url = 1", Path::new("/work")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_repository_path_env_expansion() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("STITCH_CFG_TEST_ES", "/mnt/es");
        }
        let toml = r#"
[repositories.elasticsearch]
path = "${STITCH_CFG_TEST_ES}"
"#;
        let config = Config::from_toml(toml, Path::new("/work")).unwrap();
        assert_eq!(config.checkout_dir("elasticsearch"), PathBuf::from("/mnt/es"));
        unsafe {
            std::env::remove_var("STITCH_CFG_TEST_ES");
        }
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/work"));
        config.apply_cli_settings(&CliSettings {
            output_dir: Some(PathBuf::from("/tmp/site")),
            strict: Some(true),
            ..Default::default()
        });
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/tmp/site"));
        assert!(config.build_resolved.strict);
        assert_eq!(
            config.build_resolved.navigation_file,
            PathBuf::from("/work/navigation.yml")
        );
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stitch.toml");
        std::fs::write(&path, "[build]\nstrict = true\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert!(config.build_resolved.strict);
        assert_eq!(config.config_path, Some(path));
        assert_eq!(
            config.build_resolved.checkouts_dir,
            dir.path().join("checkouts")
        );
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/stitch.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
