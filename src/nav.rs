//! Navigation tree.
//!
//! Turns the flat document and category lists into the sidebar hierarchy.
//! Children are owned by their parent; documents are referenced by their
//! index in [`Content::documents`].

use crate::content::{Category, Content, Document};
use crate::log;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum NavItem {
    Category(CategoryNode),
    Doc(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    pub label: String,
    pub position: Option<i64>,
    pub collapsed: bool,
    /// `index.md` / `README.md` of the directory, the category's own page.
    pub index: Option<usize>,
    pub children: Vec<NavItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavTree {
    pub items: Vec<NavItem>,
    /// Index page of the content root.
    pub root_index: Option<usize>,
    /// Manifest problems found while building (also logged).
    pub warnings: Vec<String>,
}

/// Build the tree. `root_manifest` orders the top level.
pub fn build(content: &Content, root_manifest: Option<&[String]>, default_collapsed: bool) -> NavTree {
    let mut builder = Builder {
        content,
        default_collapsed,
        warnings: Vec::new(),
    };
    let (items, root_index) = builder.directory(Path::new(""), root_manifest);

    for warning in &builder.warnings {
        log!("nav"; "{warning}");
    }

    NavTree {
        items,
        root_index,
        warnings: builder.warnings,
    }
}

impl NavTree {
    /// Documents in reading order: the root index, then depth-first with each
    /// category's index page before its children.
    pub fn flatten(&self) -> Vec<usize> {
        let mut out = Vec::new();
        out.extend(self.root_index);
        flatten_into(&self.items, &mut out);
        out
    }

    /// Categories enclosing `doc`, outermost first.
    pub fn trail(&self, doc: usize) -> Vec<&CategoryNode> {
        let mut trail = Vec::new();
        if trail_into(&self.items, doc, &mut trail) {
            trail
        } else {
            Vec::new()
        }
    }

    #[cfg(test)]
    pub fn contains(&self, doc: usize) -> bool {
        self.root_index == Some(doc) || contains_in(&self.items, doc)
    }
}

fn flatten_into(items: &[NavItem], out: &mut Vec<usize>) {
    for item in items {
        match item {
            NavItem::Doc(doc) => out.push(*doc),
            NavItem::Category(node) => {
                out.extend(node.index);
                flatten_into(&node.children, out);
            }
        }
    }
}

fn trail_into<'a>(items: &'a [NavItem], doc: usize, trail: &mut Vec<&'a CategoryNode>) -> bool {
    for item in items {
        match item {
            NavItem::Doc(d) if *d == doc => return true,
            NavItem::Doc(_) => {}
            NavItem::Category(node) => {
                trail.push(node);
                if node.index == Some(doc) || trail_into(&node.children, doc, trail) {
                    return true;
                }
                trail.pop();
            }
        }
    }
    false
}

#[cfg(test)]
fn contains_in(items: &[NavItem], doc: usize) -> bool {
    items.iter().any(|item| match item {
        NavItem::Doc(d) => *d == doc,
        NavItem::Category(node) => node.index == Some(doc) || contains_in(&node.children, doc),
    })
}

// ============================================================================
// Builder
// ============================================================================

struct Builder<'a> {
    content: &'a Content,
    default_collapsed: bool,
    warnings: Vec<String>,
}

/// A child of a directory before ordering.
struct Entry {
    /// Names a manifest may use for this entry.
    keys: Vec<String>,
    position: Option<i64>,
    /// Raw file or directory name, the final tie-breaker.
    name: String,
    item: NavItem,
}

impl Builder<'_> {
    /// Ordered children of `dir` and the directory's index page.
    fn directory(&mut self, dir: &Path, manifest: Option<&[String]>) -> (Vec<NavItem>, Option<usize>) {
        let content = self.content;
        let mut entries = Vec::new();
        let mut index = None;

        for (i, doc) in content.documents.iter().enumerate() {
            if doc.dir != dir {
                continue;
            }
            if doc.is_index && index.is_none() {
                index = Some(i);
                continue;
            }
            entries.push(doc_entry(i, doc));
        }

        for category in &content.categories {
            if category.dir.parent() == Some(dir) {
                let node = self.category(category);
                entries.push(Entry {
                    keys: vec![category.id.clone(), category.name.clone()],
                    position: node.position,
                    name: category.name.clone(),
                    item: NavItem::Category(node),
                });
            }
        }

        (self.order(dir, entries, manifest), index)
    }

    fn category(&mut self, category: &Category) -> CategoryNode {
        let (children, index) = self.directory(&category.dir, category.items.as_deref());
        CategoryNode {
            id: category.id.clone(),
            name: category.name.clone(),
            label: category.label.clone(),
            position: category.position,
            collapsed: category.collapsed.unwrap_or(self.default_collapsed),
            index,
            children,
        }
    }

    /// Manifest entries first, in manifest order; then by position
    /// (positioned before unpositioned), then by name.
    fn order(&mut self, dir: &Path, mut entries: Vec<Entry>, manifest: Option<&[String]>) -> Vec<NavItem> {
        let mut ordered = Vec::with_capacity(entries.len());

        let manifest = manifest.unwrap_or_default();
        for (i, key) in manifest.iter().enumerate() {
            match entries.iter().position(|entry| entry.keys.iter().any(|k| k == key)) {
                Some(found) => ordered.push(entries.remove(found).item),
                None => {
                    let reason = if manifest[..i].contains(key) {
                        "is listed twice"
                    } else {
                        "does not exist"
                    };
                    self.warnings.push(format!(
                        "ordering of `{}`: item `{key}` {reason}, skipped",
                        display_dir(dir)
                    ));
                }
            }
        }

        entries.sort_by(|a, b| {
            (a.position.is_none(), a.position, &a.name).cmp(&(b.position.is_none(), b.position, &b.name))
        });
        ordered.extend(entries.into_iter().map(|entry| entry.item));
        ordered
    }
}

fn doc_entry(index: usize, doc: &Document) -> Entry {
    let mut keys = vec![doc.id.clone(), doc.name.clone()];
    if let Some(stem) = doc.rel_path.file_stem() {
        keys.push(stem.to_string_lossy().into_owned());
    }
    Entry {
        keys,
        position: doc.position,
        name: doc.name.clone(),
        item: NavItem::Doc(index),
    }
}

fn display_dir(dir: &Path) -> String {
    if dir.as_os_str().is_empty() {
        "/".into()
    } else {
        dir.display().to_string()
    }
}
