//! Per-directory category files (`_category_.json`, `_category_.yml`).

use crate::error::SiteError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File names recognised as category metadata, in lookup order.
pub const CATEGORY_FILES: &[&str] = &["_category_.json", "_category_.yml", "_category_.yaml"];

/// Contents of a category file. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CategoryMeta {
    pub label: Option<String>,
    pub position: Option<i64>,
    pub collapsed: Option<bool>,
    /// Ordering manifest: ids or file names of this directory's children.
    pub items: Option<Vec<String>>,
}

/// A content directory that holds at least one document.
#[derive(Debug, Clone)]
pub struct Category {
    /// Directory path relative to the content root.
    pub dir: PathBuf,
    /// Raw directory name.
    pub name: String,
    /// Directory name without its number prefix; used by manifests.
    pub id: String,
    pub label: String,
    pub position: Option<i64>,
    pub collapsed: Option<bool>,
    pub items: Option<Vec<String>>,
}

pub fn is_category_file(name: &str) -> bool {
    CATEGORY_FILES.contains(&name)
}

/// Parse a category file, choosing the format by extension.
pub fn parse(source: &str, path: &Path) -> Result<CategoryMeta, SiteError> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    if is_json {
        serde_json::from_str(source).map_err(|err| {
            SiteError::configuration(path, Some(err.line()), format!("invalid category file: {err}"))
        })
    } else {
        if source.trim().is_empty() {
            return Ok(CategoryMeta::default());
        }
        serde_yaml::from_str(source).map_err(|err| {
            let line = err.location().map(|loc| loc.line());
            SiteError::configuration(path, line, format!("invalid category file: {err}"))
        })
    }
}
