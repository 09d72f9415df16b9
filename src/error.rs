//! Build error taxonomy.
//!
//! Configuration and IO errors abort the build. Content errors are scoped to
//! one document: the page is skipped, the rest of the site is still emitted
//! and the run reports failure.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    /// `quire.toml` could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed front-matter, category file or conflicting URLs.
    #[error("configuration error in {}: {message}", location(.path, .line))]
    Configuration {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    /// Malformed markup inside a single document.
    #[error("content error in {}: {message}", location(.path, .line))]
    Content {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("IO error at `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}

impl SiteError {
    pub fn configuration(path: &Path, line: Option<usize>, message: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub fn content(path: &Path, line: Option<usize>, message: impl Into<String>) -> Self {
        Self::Content {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Map an IO error onto the path it happened at.
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |err| Self::Io(path.to_path_buf(), err)
    }

    /// Everything except a content error stops the build.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Content { .. })
    }
}

/// `path:line`, or just `path` when the line is unknown.
fn location(path: &Path, line: &Option<usize>) -> String {
    match line {
        Some(line) => format!("{}:{line}", path.display()),
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_display_includes_location() {
        let err = SiteError::configuration(Path::new("docs/a.md"), Some(3), "invalid YAML");
        assert_eq!(err.to_string(), "configuration error in docs/a.md:3: invalid YAML");

        let err = SiteError::content(Path::new("docs/b.md"), None, "unclosed `:::details`");
        assert_eq!(err.to_string(), "content error in docs/b.md: unclosed `:::details`");
    }

    #[test]
    fn test_fatality() {
        assert!(!SiteError::content(Path::new("a.md"), Some(1), "x").is_fatal());
        assert!(SiteError::configuration(Path::new("a.md"), Some(1), "x").is_fatal());
        assert!(SiteError::Config(ConfigError::Validation("x".into())).is_fatal());

        let io = SiteError::io(Path::new("build"))(Error::new(ErrorKind::Other, "disk full"));
        assert!(io.is_fatal());
        assert!(io.to_string().contains("build"));
    }
}
