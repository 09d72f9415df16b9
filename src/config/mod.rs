//! Site configuration management for `quire.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[base]`    | Site metadata (title, tagline, url, base_url)    |
//! | `[build]`   | Paths, minify, sitemap, drafts, slugs, excludes  |
//! | `[theme]`   | Color mode and `[theme.search]`                  |
//! | `[sidebar]` | Root ordering manifest, collapse behavior        |
//! | `[serve]`   | Development server (port, interface, watch)      |
//! | `[extra]`   | User-defined custom fields                       |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "Frontend Interview Notes"
//! url = "https://alice.github.io"
//! base_url = "/notes/"
//!
//! [build]
//! content = "docs"
//! output = "build"
//!
//! [sidebar]
//! order = ["intro", "javascript"]
//!
//! [serve]
//! port = 3000
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod handle;
mod serve;
mod sidebar;
mod theme;

// Re-export public types used by other modules
pub use build::SlugMode;
pub use error::ConfigError;
pub use handle::{cfg, init_config, reload_config};
pub use theme::SearchConfig;

// Internal imports used in this module
use base::BaseConfig;
use build::BuildConfig;
use serve::ServeConfig;
use sidebar::SidebarConfig;
use theme::ThemeConfig;

use crate::cli::{Cli, Commands};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Component, Path, PathBuf},
};

/// Subdirectory of the cache holding the `quire start` build.
const DEV_DIR: &str = "dev";
/// Subdirectory of the cache a build writes into before publishing.
const STAGING_DIR: &str = "staging";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Theme and search settings
    #[serde(default)]
    pub theme: ThemeConfig,

    /// Sidebar settings
    #[serde(default)]
    pub sidebar: SidebarConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load the config for a command line: read `quire.toml` under the
    /// chosen root (defaults when absent) and apply CLI overrides.
    pub fn load(cli: &'static Cli) -> Result<Self, ConfigError> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Directory a build is assembled in before it replaces the output.
    pub fn staging_dir(&self) -> PathBuf {
        self.build.cache.join(STAGING_DIR)
    }

    /// Prefix a site-relative URL path (`/js/closures/`) with `base_url`.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Absolute URL for sitemap entries, if `[base] url` is set.
    pub fn absolute_url(&self, path: &str) -> Option<String> {
        self.base
            .url
            .as_deref()
            .map(|url| format!("{}{}", url.trim_end_matches('/'), self.url_for(path)))
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        // Determine the final root path based on command
        let base = cli
            .root
            .as_ref()
            .cloned()
            .unwrap_or_else(|| self.get_root().to_owned());
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => base.join(name),
            _ => base,
        };

        self.set_root(&root);
        self.update_path_with_root(&root, cli);

        match &cli.command {
            Commands::Build {
                minify,
                drafts,
                base_url,
            } => {
                Self::update_option(&mut self.build.minify, minify.as_ref());
                self.build.drafts |= *drafts;
                if let Some(base_url) = base_url {
                    self.base.base_url = normalize_base_url(base_url);
                }
            }
            Commands::Start { serve_args, watch } => {
                Self::update_option(&mut self.serve.interface, serve_args.interface.as_ref());
                Self::update_option(&mut self.serve.port, serve_args.port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
                // Development builds keep drafts and never touch the real output
                self.build.drafts = true;
                self.build.minify = false;
                self.build.output = self.build.cache.join(DEV_DIR);
            }
            Commands::Serve { serve_args } => {
                Self::update_option(&mut self.serve.interface, serve_args.interface.as_ref());
                Self::update_option(&mut self.serve.port, serve_args.port.as_ref());
            }
            Commands::Init { .. } | Commands::Clear => {}
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, cli: &Cli) {
        // Apply CLI overrides first
        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        // Normalize root to absolute path
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(&cli.config));

        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.static_dir = Self::normalize_path(&root.join(&self.build.static_dir));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.cache = Self::normalize_path(&root.join(&self.build.cache));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate field values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base.url
            && !url.starts_with("http")
        {
            return Err(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into(),
            ));
        }

        let base_url = &self.base.base_url;
        if !base_url.starts_with('/') || !base_url.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "[base.base_url] must start and end with `/`, got `{base_url}`"
            )));
        }

        if self.theme.search.excerpt_length == 0 {
            return Err(ConfigError::Validation(
                "[theme.search.excerpt_length] must be greater than 0".into(),
            ));
        }

        for pattern in &self.build.exclude {
            if let Err(err) = glob::Pattern::new(pattern) {
                return Err(ConfigError::Validation(format!(
                    "[build.exclude] invalid pattern `{pattern}`: {err}"
                )));
            }
        }

        self.validate_generated_dirs()
    }

    /// Output and cache are wiped by `build` and `clear`, so neither may
    /// cover a source path or live inside the sources.
    fn validate_generated_dirs(&self) -> Result<(), ConfigError> {
        let root = lexical(self.get_root());
        let content = lexical(&self.build.content);
        let static_dir = lexical(&self.build.static_dir);
        let config_path = lexical(&self.config_path);
        let output = lexical(&self.build.output);
        let cache = lexical(&self.build.cache);

        let sources = [
            ("site root", &root),
            ("[build.content]", &content),
            ("[build.static_dir]", &static_dir),
            ("config file", &config_path),
        ];
        for (key, dir) in [("[build.output]", &output), ("[build.cache]", &cache)] {
            for (name, source) in sources {
                if source.starts_with(dir) {
                    return Err(ConfigError::Validation(format!(
                        "{key} `{}` contains the {name} `{}` and would delete it",
                        dir.display(),
                        source.display()
                    )));
                }
            }
            for (name, source) in [sources[1], sources[2]] {
                if dir.starts_with(source) {
                    return Err(ConfigError::Validation(format!(
                        "{key} `{}` must not be inside {name}",
                        dir.display()
                    )));
                }
            }
        }

        // Staging lives in the cache and publishing replaces the output
        if cache.starts_with(&output) {
            return Err(ConfigError::Validation(
                "[build.cache] must not be inside [build.output]".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve `.` and `..` without touching the file system.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir if out.pop() => {}
            other => out.push(other),
        }
    }
    out
}

/// Turn `notes`, `/notes` or `notes/` into `/notes/`.
fn normalize_base_url(value: &str) -> String {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else {
        format!("/{trimmed}/")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn leak_cli(args: &[&str]) -> &'static Cli {
        Box::leak(Box::new(Cli::try_parse_from(args).unwrap()))
    }

    #[test]
    fn test_from_str() {
        let config = SiteConfig::from_str("[base]\ntitle = \"Notes\"\n").unwrap();
        assert_eq!(config.base.title, "Notes");
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[base\ntitle = \"Notes\"\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = SiteConfig::from_path(Path::new("/definitely/not/here/quire.toml"));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_get_root_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_set_root() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/custom/path"));
        assert_eq!(config.get_root(), Path::new("/custom/path"));
    }

    #[test]
    fn test_url_for_with_base_url() {
        let mut config = SiteConfig::default();
        assert_eq!(config.url_for("/js/closures/"), "/js/closures/");
        assert_eq!(config.url_for("/"), "/");

        config.base.base_url = "/notes/".into();
        assert_eq!(config.url_for("/js/closures/"), "/notes/js/closures/");
        assert_eq!(config.url_for("assets/quire.css"), "/notes/assets/quire.css");
        assert_eq!(config.url_for("/"), "/notes/");
    }

    #[test]
    fn test_absolute_url() {
        let mut config = SiteConfig::default();
        assert_eq!(config.absolute_url("/a/"), None);

        config.base.url = Some("https://alice.github.io/".into());
        config.base.base_url = "/notes/".into();
        assert_eq!(
            config.absolute_url("/a/").as_deref(),
            Some("https://alice.github.io/notes/a/")
        );
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("notes"), "/notes/");
        assert_eq!(normalize_base_url("/notes"), "/notes/");
        assert_eq!(normalize_base_url("/notes/"), "/notes/");
        assert_eq!(normalize_base_url("/"), "/");
        assert_eq!(normalize_base_url(""), "/");
    }

    #[test]
    fn test_load_applies_build_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("quire.toml"),
            "[base]\ntitle = \"Notes\"\n[build]\noutput = \"public\"\n",
        )
        .unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["quire", "--root", root, "build", "--minify=false", "--base-url", "notes"]);

        let config = SiteConfig::load(cli).unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.base.title, "Notes");
        assert!(!config.build.minify);
        assert_eq!(config.base.base_url, "/notes/");
        assert_eq!(config.build.output, root.join("public"));
        assert_eq!(config.build.content, root.join("docs"));
        assert_eq!(config.config_path, root.join("quire.toml"));
        assert_eq!(config.staging_dir(), root.join(".quire").join("staging"));
    }

    #[test]
    fn test_load_start_uses_dev_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quire.toml"), "").unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["quire", "--root", root, "start", "--port", "4000"]);

        let config = SiteConfig::load(cli).unwrap();

        assert!(config.build.drafts);
        assert_eq!(config.serve.port, 4000);
        assert!(config.build.output.ends_with(".quire/dev"));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["quire", "--root", root, "init", "site"]);

        let config = SiteConfig::load(cli).unwrap();

        assert!(config.get_root().ends_with("site"));
        assert!(!config.config_path.exists());
    }

    #[test]
    fn test_validate_defaults_ok() {
        let mut config = SiteConfig::default();
        config.build.content = PathBuf::from("/site/docs");
        config.build.output = PathBuf::from("/site/build");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SiteConfig::default();
        config.build.output = PathBuf::from("/site/build");

        config.base.url = Some("alice.github.io".into());
        assert!(config.validate().is_err());
        config.base.url = None;

        config.base.base_url = "notes/".into();
        assert!(config.validate().is_err());
        config.base.base_url = "/notes/".into();

        config.theme.search.excerpt_length = 0;
        assert!(config.validate().is_err());
        config.theme.search.excerpt_length = 10;

        config.build.exclude = vec!["[".into()];
        assert!(config.validate().is_err());
        config.build.exclude.clear();

        config.build.content = config.build.output.clone();
        assert!(config.validate().is_err());
    }

    fn site_at(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.set_root(root);
        config.config_path = root.join("quire.toml");
        config.build.content = root.join("docs");
        config.build.static_dir = root.join("static");
        config.build.output = root.join("build");
        config.build.cache = root.join(".quire");
        config
    }

    fn validation_message(config: &SiteConfig) -> String {
        match config.validate() {
            Err(ConfigError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_output_must_not_cover_sources() {
        let root = Path::new("/site");
        assert!(site_at(root).validate().is_ok());

        let mut config = site_at(root);
        config.build.output = root.to_path_buf();
        assert!(validation_message(&config).contains("site root"));

        config.build.output = PathBuf::from("/");
        assert!(validation_message(&config).contains("[build.output]"));

        config.build.output = root.join("docs/../build/..");
        assert!(validation_message(&config).contains("would delete"));

        config.build.output = root.join("static");
        assert!(validation_message(&config).contains("[build.static_dir]"));

        config.build.output = root.join("docs/site");
        assert!(validation_message(&config).contains("inside [build.content]"));
    }

    #[test]
    fn test_validate_cache_placement() {
        let root = Path::new("/site");
        let mut config = site_at(root);
        config.build.cache = root.to_path_buf();
        assert!(validation_message(&config).contains("[build.cache]"));

        config.build.cache = root.join("build/.quire");
        assert!(validation_message(&config).contains("inside [build.output]"));

        // Development output lives in the cache
        config.build.cache = root.join(".quire");
        config.build.output = root.join(".quire/dev");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lexical() {
        assert_eq!(lexical(Path::new("/site/docs/../build/.")), PathBuf::from("/site/build"));
        assert_eq!(lexical(Path::new("./docs")), PathBuf::from("docs"));
    }

    #[test]
    fn test_extra_fields() {
        let config = r#"
            [extra]
            custom_field = "custom_value"
            number_field = 42
            [extra.social]
            github = "alice"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(
            config.extra.get("custom_field").and_then(|v| v.as_str()),
            Some("custom_value")
        );
        assert_eq!(
            config.extra.get("number_field").and_then(|v| v.as_integer()),
            Some(42)
        );
        let social = config.extra.get("social").and_then(|v| v.as_table()).unwrap();
        assert_eq!(social.get("github").and_then(|v| v.as_str()), Some("alice"));
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str("[deploy]\nprovider = \"github\"\n");
        assert!(result.is_err());
    }
}
