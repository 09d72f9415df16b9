//! Document rendering.
//!
//! ```text
//! body ─► container::expand ─► markdown::render ─► layout::page
//!          (:::, <details>)     (pulldown-cmark)    (sidebar, toc, pager)
//! ```
//!
//! Documents render independently and in parallel; a content error in one
//! document leaves the others untouched.

pub mod container;
pub mod layout;
pub mod links;
pub mod markdown;

use crate::config::SiteConfig;
use crate::content::{Content, Naming};
use crate::error::SiteError;
use crate::nav::NavTree;
use crate::utils::html::escape_html;
use layout::{Layout, PageParts};
use links::LinkResolver;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;

/// A successfully rendered document.
#[derive(Debug)]
pub struct RenderedPage {
    /// Index into [`Content::documents`].
    pub doc: usize,
    /// Complete HTML page.
    pub html: String,
    /// Article markup only, input of the search index.
    pub article: String,
    /// Broken internal links.
    pub warnings: Vec<String>,
}

pub struct Renderer<'a> {
    config: &'a SiteConfig,
    content: &'a Content,
    nav: &'a NavTree,
    layout: Layout<'a>,
    naming: Naming,
    /// Content-relative source path -> document URL, for `.md` links.
    urls: FxHashMap<PathBuf, String>,
    /// Reading order, for previous/next links.
    order: Vec<usize>,
    rank: FxHashMap<usize, usize>,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a SiteConfig, content: &'a Content, nav: &'a NavTree, live_reload: bool) -> Self {
        let urls = content
            .documents
            .iter()
            .map(|doc| (doc.rel_path.clone(), doc.url.clone()))
            .collect();
        let order = nav.flatten();
        let rank = order.iter().enumerate().map(|(rank, doc)| (*doc, rank)).collect();

        Self {
            config,
            content,
            nav,
            layout: Layout::new(config, live_reload),
            naming: Naming {
                number_prefixes: config.build.number_prefixes,
                slug: config.build.slug,
            },
            urls,
            order,
            rank,
        }
    }

    pub fn render_document(&self, doc: usize) -> Result<RenderedPage, SiteError> {
        let documents = &self.content.documents;
        let document = &documents[doc];

        let expanded = container::expand(&document.body, document.body_line, &document.source)?;
        let dir_url = self.naming.dir_url(&document.dir);
        let resolver = LinkResolver::new(self.config, &document.dir, &dir_url, &self.urls);
        let rendered = markdown::render(&expanded, &resolver);

        let mut article = String::with_capacity(rendered.html.len() + 64);
        if !rendered.html.trim_start().starts_with("<h1") {
            article.push_str(&format!("<h1>{}</h1>\n", escape_html(&document.title)));
        }
        article.push_str(&rendered.html);

        let warnings = rendered
            .broken_links
            .iter()
            .map(|link| format!("{}: broken link `{link}`", document.rel_path.display()))
            .collect();

        let sidebar = layout::sidebar(self.nav, documents, Some(doc), self.config);
        let breadcrumbs = layout::breadcrumbs(self.nav, documents, doc, self.config);
        let toc = layout::toc(&rendered.toc);
        let (prev, next) = self.neighbours(doc);
        let pager = layout::pager(
            prev.map(|i| &documents[i]),
            next.map(|i| &documents[i]),
            self.config,
        );

        let html = self.layout.page(&PageParts {
            title: &document.title,
            description: document.description.as_deref(),
            article: &article,
            sidebar: &sidebar,
            breadcrumbs: &breadcrumbs,
            toc: &toc,
            pager: &pager,
        });

        Ok(RenderedPage {
            doc,
            html,
            article,
            warnings,
        })
    }

    /// Render every document in parallel. Results are in document order;
    /// `on_done` is called once per document.
    pub fn render_all(&self, on_done: impl Fn() + Sync) -> Vec<Result<RenderedPage, SiteError>> {
        (0..self.content.documents.len())
            .into_par_iter()
            .map(|doc| {
                let page = self.render_document(doc);
                on_done();
                page
            })
            .collect()
    }

    /// Generated home page, unless a rendered document is served at `/`.
    ///
    /// `rendered` holds the documents that rendered successfully; a root
    /// index that failed does not suppress the home page.
    pub fn landing_page(&self, rendered: &[usize]) -> Option<String> {
        let rendered: FxHashSet<usize> = rendered.iter().copied().collect();
        if rendered.iter().any(|doc| self.content.documents[*doc].url == "/") {
            return None;
        }

        let first = self
            .order
            .iter()
            .find(|doc| rendered.contains(doc))
            .map(|doc| &self.content.documents[*doc]);
        let article = self.layout.landing(first);
        let sidebar = layout::sidebar(self.nav, &self.content.documents, None, self.config);

        Some(self.layout.page(&PageParts {
            title: &self.config.base.title,
            article: &article,
            sidebar: &sidebar,
            ..PageParts::default()
        }))
    }

    pub fn not_found_page(&self) -> String {
        let article = self.layout.not_found();
        let sidebar = layout::sidebar(self.nav, &self.content.documents, None, self.config);

        self.layout.page(&PageParts {
            title: "Page Not Found",
            article: &article,
            sidebar: &sidebar,
            ..PageParts::default()
        })
    }

    fn neighbours(&self, doc: usize) -> (Option<usize>, Option<usize>) {
        match self.rank.get(&doc) {
            Some(&rank) => (
                rank.checked_sub(1).map(|prev| self.order[prev]),
                self.order.get(rank + 1).copied(),
            ),
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlugMode;
    use crate::content::{Document, frontmatter::FrontMatter};
    use crate::nav;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn doc(rel: &str, title: Option<&str>, body: &str) -> Document {
        let naming = Naming {
            number_prefixes: true,
            slug: SlugMode::Safe,
        };
        let meta = FrontMatter {
            title: title.map(str::to_owned),
            ..FrontMatter::default()
        };
        Document::new(
            Path::new("/site/docs").join(rel),
            PathBuf::from(rel),
            meta,
            body.to_owned(),
            3,
            &naming,
        )
    }

    fn content() -> Content {
        Content {
            documents: vec![
                doc("01-intro.md", Some("Intro"), "Start with [closures](js/closures.md).\n"),
                doc("js/closures.md", Some("Closures"), "# Closures in depth\n\n## Scope\n\ntext\n"),
                doc(
                    "js/unbalanced.md",
                    None,
                    ":::details Why?\nbecause\n\n[gone](nowhere.md)\n",
                ),
            ],
            categories: vec![crate::content::Category {
                dir: PathBuf::from("js"),
                name: "js".into(),
                id: "js".into(),
                label: "JavaScript".into(),
                position: None,
                collapsed: None,
                items: None,
            }],
            ..Content::default()
        }
    }

    #[test]
    fn test_render_document() {
        let content = content();
        let config = SiteConfig::default();
        let tree = nav::build(&content, None, true);
        let renderer = Renderer::new(&config, &content, &tree, false);

        let page = renderer.render_document(0).unwrap();
        assert!(page.article.starts_with("<h1>Intro</h1>\n"));
        assert!(page.article.contains("href=\"/js/closures/\""));
        assert!(page.html.contains("<title>Intro | My Notes</title>"));
        assert!(page.html.contains("<small>Next</small>Closures"));
        assert!(!page.html.contains("<small>Previous</small>"));
        assert!(page.warnings.is_empty());

        let page = renderer.render_document(1).unwrap();
        assert!(page.article.starts_with("<h1 id=\"closures-in-depth\">"));
        assert!(!page.article.contains("<h1>Closures</h1>"));
        assert!(page.html.contains("<a href=\"#scope\">Scope</a>"));
        assert!(page.html.contains("<li>JavaScript</li>"));
        assert!(page.html.contains("<small>Previous</small>Intro"));
    }

    #[test]
    fn test_unbalanced_container_is_content_error() {
        let content = content();
        let config = SiteConfig::default();
        let tree = nav::build(&content, None, true);
        let renderer = Renderer::new(&config, &content, &tree, false);

        let err = renderer.render_document(2).unwrap_err();
        assert!(!err.is_fatal());
        match err {
            SiteError::Content { path, line, .. } => {
                assert!(path.ends_with("js/unbalanced.md"));
                assert_eq!(line, Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_all_keeps_document_order() {
        let content = content();
        let config = SiteConfig::default();
        let tree = nav::build(&content, None, true);
        let renderer = Renderer::new(&config, &content, &tree, false);

        let done = std::sync::atomic::AtomicUsize::new(0);
        let pages = renderer.render_all(|| {
            done.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        });

        assert_eq!(done.into_inner(), 3);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].as_ref().unwrap().doc, 0);
        assert_eq!(pages[1].as_ref().unwrap().doc, 1);
        assert!(pages[2].is_err());
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let content = content();
        let config = SiteConfig::default();
        let tree = nav::build(&content, None, true);
        let renderer = Renderer::new(&config, &content, &tree, true);

        let first = renderer.render_document(1).unwrap();
        let second = renderer.render_document(1).unwrap();
        assert_eq!(first.html, second.html);
        assert!(first.html.contains("livereload.js"));
    }

    #[test]
    fn test_broken_links_are_warnings() {
        let mut content = content();
        content.documents[2].body = "[gone](nowhere.md)\n".into();
        let config = SiteConfig::default();
        let tree = nav::build(&content, None, true);
        let renderer = Renderer::new(&config, &content, &tree, false);

        let page = renderer.render_document(2).unwrap();
        assert_eq!(page.warnings, vec!["js/unbalanced.md: broken link `nowhere.md`".to_string()]);
    }

    #[test]
    fn test_landing_and_not_found_pages() {
        let content = content();
        let config = SiteConfig::default();
        let tree = nav::build(&content, None, true);
        let renderer = Renderer::new(&config, &content, &tree, false);

        let landing = renderer.landing_page(&[0, 1]).unwrap();
        assert!(landing.contains("quire-hero"));
        assert!(landing.contains("href=\"/intro/\">Start reading: Intro</a>"));
        assert!(renderer.not_found_page().contains("<h1>Page Not Found</h1>"));

        let mut owned = Content {
            documents: vec![doc("index.md", Some("Home"), "hi\n")],
            ..Content::default()
        };
        owned.documents[0].url = "/".into();
        let tree = nav::build(&owned, None, true);
        let renderer = Renderer::new(&config, &owned, &tree, false);
        assert!(renderer.landing_page(&[0]).is_none());
    }

    #[test]
    fn test_failed_root_index_keeps_landing_page() {
        let config = SiteConfig::default();
        let mut content = Content {
            documents: vec![
                doc("index.md", Some("Home"), ":::details Open\nnever closed\n"),
                doc("a.md", Some("Arrays"), "text\n"),
            ],
            ..Content::default()
        };
        content.documents[0].url = "/".into();
        let tree = nav::build(&content, None, true);
        let renderer = Renderer::new(&config, &content, &tree, false);

        let rendered: Vec<usize> = renderer
            .render_all(|| {})
            .into_iter()
            .filter_map(Result::ok)
            .map(|page| page.doc)
            .collect();
        assert_eq!(rendered, vec![1]);

        let landing = renderer.landing_page(&rendered).unwrap();
        assert!(landing.contains("quire-hero"));
        assert!(landing.contains("Start reading: Arrays"));
    }
}
