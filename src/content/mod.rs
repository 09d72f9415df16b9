//! Content discovery.
//!
//! Walks the content root and produces the immutable inputs of a build:
//! documents, categories and content assets.
//!
//! | Entry                         | Result                                |
//! |-------------------------------|---------------------------------------|
//! | `*.md`, `*.mdx`, `*.markdown` | [`Document`]                          |
//! | `_category_.json/.yml/.yaml`  | metadata of the enclosing [`Category`]|
//! | `.hidden`, `_partial`         | skipped                               |
//! | `[build] exclude` match       | skipped                               |
//! | anything else                 | [`Asset`], copied next to its page    |

pub mod category;
pub mod document;
pub mod frontmatter;

pub use category::{Category, CategoryMeta};
pub use document::{Document, Naming};

use crate::config::{ConfigError, SiteConfig};
use crate::error::SiteError;
use crate::log;
use rustc_hash::FxHashMap;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

/// A non-markdown file under the content root.
#[derive(Debug, Clone)]
pub struct Asset {
    pub source: PathBuf,
    /// Output path relative to the site root, e.g. `js/img/scope.png`.
    pub output: PathBuf,
}

/// Everything discovered under the content root.
#[derive(Debug, Default)]
pub struct Content {
    pub documents: Vec<Document>,
    pub categories: Vec<Category>,
    pub assets: Vec<Asset>,
    /// Items of the root `_category_` file, if any.
    pub root_items: Option<Vec<String>>,
    /// Drafts left out of this build.
    pub skipped_drafts: usize,
}

impl Content {
    /// Index of the document served at `url`.
    pub fn find_by_url(&self, url: &str) -> Option<usize> {
        self.documents.iter().position(|doc| doc.url == url)
    }
}

/// Discover documents, categories and assets under `[build] content`.
pub fn discover(config: &SiteConfig) -> Result<Content, SiteError> {
    let root = &config.build.content;
    if !root.is_dir() {
        log!("content"; "content directory `{}` not found, building an empty site", root.display());
        return Ok(Content::default());
    }

    let excludes = compile_excludes(&config.build.exclude)?;
    let naming = Naming {
        number_prefixes: config.build.number_prefixes,
        slug: config.build.slug,
    };

    let mut content = Content::default();
    let mut category_meta: BTreeMap<PathBuf, CategoryMeta> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            SiteError::Io(path, err.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let rel_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        if is_excluded(&rel_path, &excludes) {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if category::is_category_file(&name) {
            let dir = rel_path.parent().map(Path::to_path_buf).unwrap_or_default();
            let source = fs::read_to_string(path).map_err(SiteError::io(path))?;
            // First file in lookup order wins
            if !category_meta.contains_key(&dir) {
                category_meta.insert(dir, category::parse(&source, path)?);
            }
        } else if document::is_markdown(path) {
            let source = fs::read_to_string(path).map_err(SiteError::io(path))?;
            let parsed = frontmatter::parse(&source, path)?;
            if parsed.meta.draft && !config.build.drafts {
                content.skipped_drafts += 1;
                continue;
            }
            let untitled = parsed.meta.title.is_none();
            let mut doc = Document::new(
                path.to_path_buf(),
                rel_path,
                parsed.meta,
                parsed.body.to_owned(),
                parsed.body_line,
                &naming,
            );
            if untitled && doc.is_index {
                doc.title = index_title(&doc.dir, &naming, config);
            }
            content.documents.push(doc);
        } else {
            let dir = rel_path.parent().unwrap_or(Path::new(""));
            let url_dir = naming.dir_url(dir);
            let output = PathBuf::from(url_dir.trim_start_matches('/')).join(entry.file_name());
            content.assets.push(Asset {
                source: path.to_path_buf(),
                output,
            });
        }
    }

    check_url_collisions(&content.documents)?;

    content.root_items = category_meta
        .get(Path::new(""))
        .and_then(|meta| meta.items.clone());
    content.categories = build_categories(&content.documents, &category_meta, &naming);

    Ok(content)
}

// ============================================================================
// Filtering
// ============================================================================

/// Hidden entries and `_`-prefixed partials, except category files.
fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (name.starts_with('_') && !category::is_category_file(&name))
}

fn compile_excludes(patterns: &[String]) -> Result<Vec<glob::Pattern>, SiteError> {
    patterns
        .iter()
        .map(|pattern| {
            glob::Pattern::new(pattern).map_err(|err| {
                SiteError::from(ConfigError::Validation(format!(
                    "[build.exclude] invalid pattern `{pattern}`: {err}"
                )))
            })
        })
        .collect()
}

fn is_excluded(rel_path: &Path, excludes: &[glob::Pattern]) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let rel = slash_path(rel_path);
    excludes.iter().any(|pattern| pattern.matches(&rel))
}

/// Relative path with `/` separators on every platform.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Categories & URLs
// ============================================================================

/// Title of an untitled `index.md`: the directory label, or the site title
/// for the content root.
fn index_title(dir: &Path, naming: &Naming, config: &SiteConfig) -> String {
    match dir.file_name() {
        Some(name) => naming.split(&name.to_string_lossy()).1.to_owned(),
        None => config.base.title.clone(),
    }
}

/// One category per directory that holds a document, directly or below.
fn build_categories(
    documents: &[Document],
    meta: &BTreeMap<PathBuf, CategoryMeta>,
    naming: &Naming,
) -> Vec<Category> {
    let dirs: BTreeSet<&Path> = documents
        .iter()
        .flat_map(|doc| doc.dir.ancestors())
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect();

    dirs.into_iter()
        .map(|dir| {
            let name = dir
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let (prefix_position, bare) = naming.split(&name);
            let bare = bare.to_owned();
            let meta = meta.get(dir).cloned().unwrap_or_default();
            Category {
                dir: dir.to_path_buf(),
                label: meta.label.unwrap_or_else(|| bare.clone()),
                position: meta.position.or(prefix_position),
                collapsed: meta.collapsed,
                items: meta.items,
                id: bare,
                name,
            }
        })
        .collect()
}

/// Two documents may not resolve to the same URL.
fn check_url_collisions(documents: &[Document]) -> Result<(), SiteError> {
    let mut seen: FxHashMap<&str, &Path> = FxHashMap::default();
    for doc in documents {
        if let Some(first) = seen.insert(doc.url.as_str(), doc.rel_path.as_path()) {
            return Err(SiteError::configuration(
                &doc.source,
                None,
                format!(
                    "URL `{}` is already used by `{}`",
                    doc.url,
                    first.display()
                ),
            ));
        }
    }
    Ok(())
}
