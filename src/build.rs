//! Site building orchestration.
//!
//! Runs the pipeline once, from source files to a published output tree.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── content::discover() ──► documents, categories, assets
//!     │                           (front-matter errors abort here)
//!     ├── nav::build()        ──► sidebar tree, reading order
//!     │
//!     ├── Renderer::render_all() ─► pages in parallel
//!     │                              (content errors skip one page)
//!     ├── SearchIndex::build()
//!     │
//!     └── Emitter ──► staging dir ──► publish() ──► output dir
//! ```

use crate::{
    config::SiteConfig,
    content,
    emit::Emitter,
    error::SiteError,
    generator::sitemap::{PageRef, build_sitemap},
    log,
    logger::RenderProgress,
    nav,
    render::{
        RenderedPage, Renderer,
        layout::{ASSETS_DIR, LIVE_RELOAD_ASSET, THEME_ASSETS},
    },
    search::{self, SearchIndex},
};
use anyhow::bail;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// File name of the not-found page.
const NOT_FOUND_FILE: &str = "404.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `quire build`
    Production,
    /// `quire start`: live reload injected
    Development,
}

/// Outcome of a build that got as far as publishing.
#[derive(Debug, Default)]
pub struct BuildSummary {
    /// Document pages written.
    pub pages: usize,
    /// Documents skipped because of content errors.
    pub failed: Vec<SiteError>,
    /// Nav manifest problems and broken links.
    pub warnings: Vec<String>,
    /// Distinct search terms, 0 when search is off.
    pub terms: usize,
    pub output: PathBuf,
}

impl BuildSummary {
    /// Content errors turn into a failed run after the site is published.
    pub fn ensure_success(&self) -> anyhow::Result<()> {
        if self.failed.is_empty() {
            return Ok(());
        }
        bail!("{} document(s) failed to render", self.failed.len())
    }
}

/// Build the whole site into `[build] output`.
///
/// Fatal errors leave the previous output untouched. Content errors are
/// collected in the summary and the remaining pages are still published.
pub fn build_site(config: &SiteConfig, mode: Mode) -> Result<BuildSummary, SiteError> {
    let content = content::discover(config)?;
    log!(
        "content";
        "{} documents, {} categories, {} assets",
        content.documents.len(),
        content.categories.len(),
        content.assets.len()
    );
    if content.skipped_drafts > 0 {
        log!("content"; "skipped {} drafts", content.skipped_drafts);
    }

    let root_manifest = config
        .sidebar
        .order
        .as_deref()
        .or(content.root_items.as_deref());
    let tree = nav::build(&content, root_manifest, config.sidebar.collapsed);

    let renderer = Renderer::new(config, &content, &tree, mode == Mode::Development);
    let results = {
        let progress = RenderProgress::start(content.documents.len());
        renderer.render_all(|| {
            if let Some(progress) = &progress {
                progress.tick();
            }
        })
    };

    let mut pages = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for result in results {
        match result {
            Ok(page) => pages.push(page),
            Err(err) if !err.is_fatal() => {
                log!("error"; "{err}");
                failed.push(err);
            }
            Err(err) => return Err(err),
        }
    }

    let mut warnings = tree.warnings.clone();
    for warning in pages.iter().flat_map(|page| &page.warnings) {
        log!("warn"; "{warning}");
        warnings.push(warning.clone());
    }

    // ========================================================================
    // Emit
    // ========================================================================

    let emitter = Emitter::new(config)?;
    emitter.copy_tree(&config.build.static_dir)?;
    for asset in &content.assets {
        emitter.copy_file(&asset.source, &asset.output)?;
    }

    pages
        .par_iter()
        .try_for_each(|page| emitter.write_page(&content.documents[page.doc].url, &page.html))?;

    let rendered: Vec<usize> = pages.iter().map(|page| page.doc).collect();
    let landing = renderer.landing_page(&rendered);
    if let Some(html) = &landing {
        emitter.write_page("/", html)?;
    }
    emitter.write_html(Path::new(NOT_FOUND_FILE), &renderer.not_found_page())?;

    write_theme_assets(&emitter, mode)?;
    let terms = write_search_index(config, &content, &pages, &emitter)?;

    let mut sitemap_pages = Vec::with_capacity(pages.len() + 1);
    if landing.is_some() {
        sitemap_pages.push(PageRef { url: "/", source: None });
    }
    sitemap_pages.extend(pages.iter().map(|page| {
        let doc = &content.documents[page.doc];
        PageRef {
            url: &doc.url,
            source: Some(doc.source.as_path()),
        }
    }));
    build_sitemap(config, &sitemap_pages, &emitter)?;

    let output = emitter.publish()?;
    log!("build"; "{} pages -> {}", pages.len(), output.display());

    Ok(BuildSummary {
        pages: pages.len(),
        failed,
        warnings,
        terms,
        output,
    })
}

fn write_theme_assets(emitter: &Emitter, mode: Mode) -> Result<(), SiteError> {
    let dir = Path::new(ASSETS_DIR);
    for (name, body) in THEME_ASSETS {
        emitter.write_file(&dir.join(name), body.as_bytes())?;
    }
    if mode == Mode::Development {
        let (name, body) = LIVE_RELOAD_ASSET;
        emitter.write_file(&dir.join(name), body.as_bytes())?;
    }
    Ok(())
}

/// Returns the number of distinct terms written.
fn write_search_index(
    config: &SiteConfig,
    content: &content::Content,
    pages: &[RenderedPage],
    emitter: &Emitter,
) -> Result<usize, SiteError> {
    if !config.theme.search.enable {
        return Ok(0);
    }

    let entries: Vec<search::Entry<'_>> = pages
        .iter()
        .map(|page| {
            let doc = &content.documents[page.doc];
            search::Entry {
                title: &doc.title,
                url: config.url_for(&doc.url),
                html: &page.article,
            }
        })
        .collect();
    let index = SearchIndex::build(&entries, &config.theme.search);

    let path = Path::new(search::INDEX_FILE);
    let json = index
        .to_json()
        .map_err(|err| SiteError::Io(path.to_path_buf(), err.into()))?;
    emitter.write_file(path, json.as_bytes())?;

    log!("search"; "{} documents, {} terms", index.documents.len(), index.term_count());
    Ok(index.term_count())
}
