//! Sitemap generation.
//!
//! Generates a sitemap.xml file listing all pages for search engine indexing.
//! Written only when `[base] url` is set, since sitemap entries must be
//! absolute URLs.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/notes/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{
    config::SiteConfig,
    emit::Emitter,
    error::SiteError,
    log,
    utils::minify::{MinifyType, minify},
};
use chrono::{DateTime, Utc};
use std::{fs, path::Path};

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub const SITEMAP_FILE: &str = "sitemap.xml";

// ============================================================================
// Public API
// ============================================================================

/// A page to list: its site-relative URL and the source it was built from.
#[derive(Debug, Clone, Copy)]
pub struct PageRef<'a> {
    pub url: &'a str,
    pub source: Option<&'a Path>,
}

/// Build sitemap if enabled in config. Returns whether one was written.
pub fn build_sitemap(config: &SiteConfig, pages: &[PageRef<'_>], emitter: &Emitter) -> Result<bool, SiteError> {
    if !config.build.sitemap {
        return Ok(false);
    }
    let Some(sitemap) = Sitemap::from_pages(config, pages) else {
        return Ok(false);
    };

    let count = sitemap.urls.len();
    let xml = sitemap.into_xml();
    let xml = minify(MinifyType::Xml(xml.as_bytes()), config.build.minify);
    emitter.write_file(Path::new(SITEMAP_FILE), &xml)?;

    log!("sitemap"; "{count} urls");
    Ok(true)
}

// ============================================================================
// Sitemap Implementation
// ============================================================================

/// Sitemap data structure
struct Sitemap {
    /// List of URL entries
    urls: Vec<UrlEntry>,
}

/// Single URL entry in the sitemap
struct UrlEntry {
    /// Full URL location
    loc: String,
    /// Last modification date (optional, YYYY-MM-DD format)
    lastmod: Option<String>,
}

impl Sitemap {
    /// `None` when the site has no absolute URL.
    fn from_pages(config: &SiteConfig, pages: &[PageRef<'_>]) -> Option<Self> {
        let urls = pages
            .iter()
            .map(|page| {
                config.absolute_url(page.url).map(|loc| UrlEntry {
                    loc,
                    lastmod: page.source.and_then(lastmod_ymd),
                })
            })
            .collect::<Option<Vec<_>>>()?;

        config.base.url.as_ref().map(|_| Self { urls })
    }

    /// Generate sitemap XML string.
    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Modification date of `source` in UTC.
fn lastmod_ymd(source: &Path) -> Option<String> {
    let modified = fs::metadata(source).and_then(|meta| meta.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified).format("%Y-%m-%d").to_string())
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================
