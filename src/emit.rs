//! Static output emitter.
//!
//! A build writes everything into a staging directory under the cache.
//! Only [`Emitter::publish`] touches the output directory: it removes the
//! previous output and moves the staging tree into its place. An emitter
//! dropped without publishing removes its staging directory, so a failed
//! build leaves the old output untouched.

use crate::config::SiteConfig;
use crate::error::SiteError;
use crate::utils::minify::{MinifyType, minify};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};
use walkdir::WalkDir;

pub struct Emitter {
    staging: PathBuf,
    output: PathBuf,
    minify: bool,
    published: bool,
}

impl Emitter {
    pub fn new(config: &SiteConfig) -> Result<Self, SiteError> {
        Self::with_paths(config.staging_dir(), config.build.output.clone(), config.build.minify)
    }

    /// Start from an empty staging directory.
    pub fn with_paths(staging: PathBuf, output: PathBuf, minify: bool) -> Result<Self, SiteError> {
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(SiteError::io(&staging))?;
        }
        fs::create_dir_all(&staging).map_err(SiteError::io(&staging))?;
        Ok(Self {
            staging,
            output,
            minify,
            published: false,
        })
    }

    #[cfg(test)]
    pub fn staging(&self) -> &Path {
        &self.staging
    }

    /// Write the page served at `url`.
    pub fn write_page(&self, url: &str, html: &str) -> Result<(), SiteError> {
        self.write_html(&page_path(url), html)
    }

    /// Write an HTML file at `rel`, minified when enabled.
    pub fn write_html(&self, rel: &Path, html: &str) -> Result<(), SiteError> {
        let html = minify(MinifyType::Html(html.as_bytes()), self.minify);
        self.write_file(rel, &html)
    }

    /// Write `bytes` at `rel` below the site root.
    pub fn write_file(&self, rel: &Path, bytes: &[u8]) -> Result<(), SiteError> {
        let path = self.staging.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(SiteError::io(parent))?;
        }
        fs::write(&path, bytes).map_err(SiteError::io(&path))
    }

    pub fn copy_file(&self, source: &Path, rel: &Path) -> Result<(), SiteError> {
        let dest = self.staging.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(SiteError::io(parent))?;
        }
        fs::copy(source, &dest).map_err(SiteError::io(source))?;
        Ok(())
    }

    /// Copy the contents of `dir` into the site root. Returns the number of
    /// files copied; a missing directory copies nothing.
    pub fn copy_tree(&self, dir: &Path) -> Result<usize, SiteError> {
        if !dir.is_dir() {
            return Ok(0);
        }
        copy_dir(dir, &self.staging)
    }

    /// Replace the output directory with the staging tree.
    pub fn publish(mut self) -> Result<PathBuf, SiteError> {
        let output = self.output.clone();
        if output.exists() {
            fs::remove_dir_all(&output).map_err(SiteError::io(&output))?;
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(SiteError::io(parent))?;
        }

        // Rename fails across filesystems
        if fs::rename(&self.staging, &output).is_err() {
            copy_dir(&self.staging, &output)?;
            fs::remove_dir_all(&self.staging).map_err(SiteError::io(&self.staging))?;
        }

        self.published = true;
        Ok(output)
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        if !self.published {
            fs::remove_dir_all(&self.staging).ok();
        }
    }
}

/// `/` -> `index.html`, `/js/closures/` -> `js/closures/index.html`.
pub fn page_path(url: &str) -> PathBuf {
    let mut path: PathBuf = Path::new(url.trim_matches('/'))
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    path.push("index.html");
    path
}

fn copy_dir(from: &Path, to: &Path) -> Result<usize, SiteError> {
    let mut copied = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(from).to_path_buf();
            SiteError::Io(path, err.into())
        })?;
        let rel = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(SiteError::io(&dest))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &dest).map_err(SiteError::io(entry.path()))?;
            copied += 1;
        }
    }
    Ok(copied)
}
