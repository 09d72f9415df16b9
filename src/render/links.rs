//! Link rewriting for rendered documents.
//!
//! | Link in markdown        | From `js/closures.md` | Result (base `/notes/`)  |
//! |-------------------------|-----------------------|--------------------------|
//! | `./scope.md#hoisting`   | doc link              | `/notes/js/scope/#hoisting` |
//! | `../css/README.md`      | doc link              | `/notes/css/`            |
//! | `img/chain.png`         | relative asset        | `/notes/js/img/chain.png`|
//! | `/static/logo.png`      | site-absolute         | `/notes/static/logo.png` |
//! | `https://mdn.dev`, `#x` | external / fragment   | unchanged                |

use crate::config::SiteConfig;
use crate::content::document::is_markdown;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Resolves link destinations for one document.
pub struct LinkResolver<'a> {
    config: &'a SiteConfig,
    /// Directory of the source file, relative to the content root.
    source_dir: &'a Path,
    /// URL of that directory (without `base_url`).
    dir_url: &'a str,
    /// Content-relative source path -> document URL.
    documents: &'a FxHashMap<PathBuf, String>,
}

impl<'a> LinkResolver<'a> {
    pub fn new(
        config: &'a SiteConfig,
        source_dir: &'a Path,
        dir_url: &'a str,
        documents: &'a FxHashMap<PathBuf, String>,
    ) -> Self {
        Self {
            config,
            source_dir,
            dir_url,
            documents,
        }
    }

    /// Rewrite `dest`. `Err` carries the original destination of a markdown
    /// link that names no known document.
    pub fn resolve(&self, dest: &str) -> Result<String, String> {
        if dest.is_empty() || dest.starts_with('#') || dest.starts_with("//") || has_scheme(dest) {
            return Ok(dest.to_owned());
        }

        let (path, suffix) = split_suffix(dest);

        if is_markdown(Path::new(path)) {
            let target = normalize_source(self.source_dir, path);
            return match self.documents.get(&target) {
                Some(url) => Ok(format!("{}{suffix}", self.config.url_for(url))),
                None => Err(dest.to_owned()),
            };
        }

        if path.starts_with('/') {
            let base = &self.config.base.base_url;
            if base != "/" && path.starts_with(base.as_str()) {
                return Ok(dest.to_owned());
            }
            return Ok(format!("{}{suffix}", self.config.url_for(path)));
        }

        let url = normalize_url(self.dir_url, path);
        Ok(format!("{}{suffix}", self.config.url_for(&url)))
    }
}

/// `mailto:`, `https:`, `data:`... a `:` before any `/`, `?` or `#`.
fn has_scheme(dest: &str) -> bool {
    let end = dest.find(['/', '?', '#']).unwrap_or(dest.len());
    dest[..end].contains(':')
}

/// Split `path?query#fragment` into the path and the rest.
fn split_suffix(dest: &str) -> (&str, &str) {
    let at = dest.find(['?', '#']).unwrap_or(dest.len());
    dest.split_at(at)
}

/// Resolve a markdown link against the source directory, giving a
/// content-relative path. Percent escapes are decoded.
fn normalize_source(source_dir: &Path, link: &str) -> PathBuf {
    let mut parts: Vec<String> = if link.starts_with('/') {
        Vec::new()
    } else {
        source_dir
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect()
    };
    for segment in link.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            segment => parts.push(
                urlencoding::decode(segment)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| segment.to_owned()),
            ),
        }
    }
    parts.iter().collect()
}

/// Resolve a relative URL against a directory URL, keeping a trailing `/`.
fn normalize_url(dir_url: &str, link: &str) -> String {
    let mut parts: Vec<&str> = dir_url.split('/').filter(|s| !s.is_empty()).collect();
    for segment in link.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            segment => parts.push(segment),
        }
    }
    let mut url = format!("/{}", parts.join("/"));
    if link.ends_with('/') && !url.ends_with('/') {
        url.push('/');
    }
    url
}
