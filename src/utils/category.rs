//! File category classification for watch mode.
//!
//! | Category | Reaction                         | Example Files        |
//! |----------|----------------------------------|----------------------|
//! | Content  | Full rebuild                     | `docs/**/*.md`       |
//! | Static   | Full rebuild                     | `static/img/*`       |
//! | Config   | Reload `quire.toml`, then rebuild| `quire.toml`         |
//! | Unknown  | Ignored                          | output, cache, other |

use crate::config::SiteConfig;
use std::{
    env,
    path::{Path, PathBuf},
};

/// Category of a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Anything under the content root (documents, category files, assets)
    Content,
    /// File under the static directory
    Static,
    /// Site configuration (quire.toml)
    Config,
    /// File outside watched locations
    Unknown,
}

impl FileCategory {
    /// Short name for log lines
    pub const fn name(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Static => "static",
            Self::Config => "config",
            Self::Unknown => "unknown",
        }
    }
}

/// Categorize a file path to decide how the watcher reacts to it.
///
/// Paths inside the output or cache directory are `Unknown`, so the
/// watcher never reacts to its own writes.
pub fn categorize_path(path: &Path, config: &SiteConfig) -> FileCategory {
    let path = normalize_path(path);

    if path == config.config_path {
        FileCategory::Config
    } else if path.starts_with(&config.build.cache) || path.starts_with(&config.build.output) {
        FileCategory::Unknown
    } else if path.starts_with(&config.build.content) {
        FileCategory::Content
    } else if path.starts_with(&config.build.static_dir) {
        FileCategory::Static
    } else {
        FileCategory::Unknown
    }
}

/// Normalize a path to absolute form for reliable comparison.
///
/// Config paths are already canonicalized, so incoming watcher paths are
/// canonicalized too before comparison. Deleted files fall back to joining
/// the current directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.config_path = root.join("quire.toml");
        config.build.content = root.join("docs");
        config.build.static_dir = root.join("static");
        config.build.output = root.join("build");
        config.build.cache = root.join(".quire");
        config
    }

    #[test]
    fn test_category_name() {
        assert_eq!(FileCategory::Content.name(), "content");
        assert_eq!(FileCategory::Static.name(), "static");
        assert_eq!(FileCategory::Config.name(), "config");
        assert_eq!(FileCategory::Unknown.name(), "unknown");
    }

    #[test]
    fn test_categorize_path() {
        let root = Path::new("/site");
        let config = config_at(root);

        assert_eq!(categorize_path(&root.join("quire.toml"), &config), FileCategory::Config);
        assert_eq!(categorize_path(&root.join("docs/js/a.md"), &config), FileCategory::Content);
        assert_eq!(categorize_path(&root.join("static/logo.png"), &config), FileCategory::Static);
        assert_eq!(categorize_path(&root.join("build/index.html"), &config), FileCategory::Unknown);
        assert_eq!(
            categorize_path(&root.join(".quire/dev/index.html"), &config),
            FileCategory::Unknown
        );
        assert_eq!(categorize_path(&root.join("README.md"), &config), FileCategory::Unknown);
    }

    #[test]
    fn test_normalize_path_relative_becomes_absolute() {
        let normalized = normalize_path(Path::new("some/relative/file.md"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.md");
        std::fs::write(&file, "# a").unwrap();
        assert_eq!(normalize_path(&file), file.canonicalize().unwrap());
    }
}
