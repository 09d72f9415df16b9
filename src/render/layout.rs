//! Page layout.
//!
//! Pages are produced by filling the `{name}` placeholders of the embedded
//! `layout.html`. Values are inserted verbatim, so every fragment built here
//! escapes its own text.

use super::markdown::TocEntry;
use crate::config::SiteConfig;
use crate::content::Document;
use crate::nav::{CategoryNode, NavItem, NavTree};
use crate::utils::html::escape_html;

const LAYOUT: &str = include_str!("../embed/layout.html");
const LANDING: &str = include_str!("../embed/landing.html");

/// Output directory of the embedded theme files.
pub const ASSETS_DIR: &str = "assets";

/// Theme files written to every build.
pub const THEME_ASSETS: &[(&str, &str)] = &[
    ("quire.css", include_str!("../embed/quire.css")),
    ("quire.js", include_str!("../embed/quire.js")),
    ("search.js", include_str!("../embed/search.js")),
];

/// Written only to development builds.
pub const LIVE_RELOAD_ASSET: (&str, &str) = ("livereload.js", include_str!("../embed/livereload.js"));

/// Polled by `livereload.js`, answered by the dev server.
pub const RELOAD_ENDPOINT: &str = "/__quire/reload";

/// Replace `{name}` tokens in one pass. Unknown tokens stay as they are and
/// inserted values are never expanded again.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let extra: usize = vars.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
            .unwrap_or(after.len());
        let value = vars
            .iter()
            .find(|(name, _)| *name == &after[..len])
            .filter(|_| after[len..].starts_with('}'));

        match value {
            Some((_, value)) => {
                out.push_str(value);
                rest = &after[len + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

// ============================================================================
// Page Chrome
// ============================================================================

/// Pre-rendered fragments of one page.
#[derive(Debug, Default)]
pub struct PageParts<'a> {
    /// Plain-text page title.
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub article: &'a str,
    pub sidebar: &'a str,
    pub breadcrumbs: &'a str,
    pub toc: &'a str,
    pub pager: &'a str,
}

/// Wraps page fragments into the full HTML document.
pub struct Layout<'a> {
    config: &'a SiteConfig,
    live_reload: bool,
}

impl<'a> Layout<'a> {
    pub const fn new(config: &'a SiteConfig, live_reload: bool) -> Self {
        Self { config, live_reload }
    }

    pub fn page(&self, parts: &PageParts<'_>) -> String {
        let config = self.config;
        let site_title = escape_html(&config.base.title);
        let page_title = if parts.title.is_empty() || parts.title == config.base.title {
            site_title.clone()
        } else {
            format!("{} | {site_title}", escape_html(parts.title))
        };
        let description = escape_html(parts.description.unwrap_or(&config.base.tagline));
        let assets = href(config, &format!("/{ASSETS_DIR}/"));
        let home = href(config, "/");
        let footer = self.footer();
        let scripts = self.scripts(&assets);
        let lang = escape_html(&config.base.language);

        fill_template(
            LAYOUT,
            &[
                ("lang", lang.as_str()),
                ("theme", if config.theme.dark_mode { "dark" } else { "light" }),
                ("theme_auto", bool_attr(config.theme.respect_prefers_color_scheme)),
                ("page_title", page_title.as_str()),
                ("description", description.as_str()),
                ("assets", assets.as_str()),
                ("home", home.as_str()),
                ("site_title", site_title.as_str()),
                ("search_box", self.search_box()),
                ("theme_toggle", self.theme_toggle()),
                ("sidebar", parts.sidebar),
                ("breadcrumbs", parts.breadcrumbs),
                ("article", parts.article),
                ("pager", parts.pager),
                ("toc", parts.toc),
                ("footer", footer.as_str()),
                ("scripts", scripts.as_str()),
            ],
        )
    }

    /// Hero section of the generated landing page.
    pub fn landing(&self, first: Option<&Document>) -> String {
        let config = self.config;
        let start_link = first
            .map(|doc| {
                format!(
                    "<a class=\"quire-button\" href=\"{}\">Start reading: {}</a>",
                    href(config, &doc.url),
                    escape_html(doc.label())
                )
            })
            .unwrap_or_default();

        let site_title = escape_html(&config.base.title);
        let tagline = escape_html(&config.base.tagline);

        fill_template(
            LANDING,
            &[
                ("site_title", site_title.as_str()),
                ("tagline", tagline.as_str()),
                ("start_link", start_link.as_str()),
            ],
        )
    }

    /// Article of `404.html`.
    pub fn not_found(&self) -> String {
        format!(
            "<h1>Page Not Found</h1>\n<p>We could not find what you were looking for.</p>\n\
             <p><a href=\"{}\">Back to the home page</a></p>\n",
            href(self.config, "/")
        )
    }

    fn search_box(&self) -> &'static str {
        if self.config.theme.search.enable {
            "<div class=\"quire-search\"><input type=\"search\" id=\"quire-search-input\" \
             placeholder=\"Search\" aria-label=\"Search\" autocomplete=\"off\">\
             <ul id=\"quire-search-results\" class=\"quire-search-results\" hidden></ul></div>"
        } else {
            ""
        }
    }

    fn theme_toggle(&self) -> &'static str {
        if self.config.theme.disable_switch {
            ""
        } else {
            "<button class=\"quire-theme-toggle\" type=\"button\" \
             aria-label=\"Switch between dark and light mode\">&#9680;</button>"
        }
    }

    fn footer(&self) -> String {
        let copyright = &self.config.base.copyright;
        if copyright.is_empty() {
            "Built with quire".into()
        } else {
            format!("{} &middot; Built with quire", escape_html(copyright))
        }
    }

    fn scripts(&self, assets: &str) -> String {
        let mut scripts = String::new();
        let search = &self.config.theme.search;
        if search.enable {
            scripts.push_str(&format!(
                "<script src=\"{assets}search.js\" data-index=\"{}\" data-min-term=\"{}\" defer></script>\n",
                href(self.config, "/search-index.json"),
                search.min_term_length
            ));
        }
        if self.live_reload {
            scripts.push_str(&format!(
                "<script src=\"{assets}{}\" data-endpoint=\"{RELOAD_ENDPOINT}\" defer></script>\n",
                LIVE_RELOAD_ASSET.0
            ));
        }
        scripts
    }
}

const fn bool_attr(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

// ============================================================================
// Navigation Fragments
// ============================================================================

/// Sidebar menu with `current` highlighted and its trail expanded.
pub fn sidebar(nav: &NavTree, documents: &[Document], current: Option<usize>, config: &SiteConfig) -> String {
    let trail = current.map(|doc| nav.trail(doc)).unwrap_or_default();
    let menu = Menu {
        documents,
        current,
        trail: &trail,
        config,
    };

    let mut out = String::from("<nav class=\"quire-sidebar\" aria-label=\"Docs sidebar\"><ul class=\"quire-menu\">");
    if let Some(root) = nav.root_index {
        out.push_str("<li>");
        menu.doc_link(&mut out, root);
        out.push_str("</li>");
    }
    menu.items(&mut out, &nav.items);
    out.push_str("</ul></nav>");
    out
}

struct Menu<'a> {
    documents: &'a [Document],
    current: Option<usize>,
    trail: &'a [&'a CategoryNode],
    config: &'a SiteConfig,
}

impl Menu<'_> {
    fn items(&self, out: &mut String, items: &[NavItem]) {
        for item in items {
            match item {
                NavItem::Doc(doc) => {
                    out.push_str("<li>");
                    self.doc_link(out, *doc);
                    out.push_str("</li>");
                }
                NavItem::Category(node) => self.category(out, node),
            }
        }
    }

    fn category(&self, out: &mut String, node: &CategoryNode) {
        let in_trail = self.trail.iter().any(|open| std::ptr::eq(*open, node));
        let open = if !node.collapsed || in_trail { " open" } else { "" };

        out.push_str(&format!("<li class=\"quire-menu-category\"><details{open}><summary>"));
        match node.index {
            Some(index) => self.link(out, index, &node.label),
            None => out.push_str(&format!(
                "<span class=\"quire-menu-label\">{}</span>",
                escape_html(&node.label)
            )),
        }
        out.push_str("</summary><ul>");
        self.items(out, &node.children);
        out.push_str("</ul></details></li>");
    }

    fn doc_link(&self, out: &mut String, doc: usize) {
        self.link(out, doc, self.documents[doc].label());
    }

    fn link(&self, out: &mut String, doc: usize, label: &str) {
        let href = href(self.config, &self.documents[doc].url);
        let label = escape_html(label);
        if self.current == Some(doc) {
            out.push_str(&format!(
                "<a class=\"quire-menu-link active\" aria-current=\"page\" href=\"{href}\">{label}</a>"
            ));
        } else {
            out.push_str(&format!("<a class=\"quire-menu-link\" href=\"{href}\">{label}</a>"));
        }
    }
}

/// `url` under `base_url`, escaped for an attribute value.
fn href(config: &SiteConfig, url: &str) -> String {
    escape_html(&config.url_for(url))
}

/// `Home › Category › Page`. Empty for the root index.
pub fn breadcrumbs(nav: &NavTree, documents: &[Document], doc: usize, config: &SiteConfig) -> String {
    if nav.root_index == Some(doc) {
        return String::new();
    }

    let mut out = format!(
        "<nav aria-label=\"Breadcrumbs\"><ol class=\"quire-breadcrumbs\"><li><a href=\"{}\">Home</a></li>",
        href(config, "/")
    );
    for node in nav.trail(doc) {
        if node.index == Some(doc) {
            continue;
        }
        let label = escape_html(&node.label);
        match node.index {
            Some(index) => out.push_str(&format!(
                "<li><a href=\"{}\">{label}</a></li>",
                href(config, &documents[index].url)
            )),
            None => out.push_str(&format!("<li>{label}</li>")),
        }
    }
    out.push_str(&format!(
        "<li aria-current=\"page\">{}</li></ol></nav>",
        escape_html(&documents[doc].title)
    ));
    out
}

/// "On this page" list. Empty when the page has no h2/h3.
pub fn toc(entries: &[TocEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = String::from(
        "<nav class=\"quire-toc\" aria-label=\"On this page\"><p class=\"quire-toc-title\">On this page</p><ul>",
    );
    for entry in entries {
        out.push_str(&format!(
            "<li class=\"toc-h{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            escape_html(&entry.id),
            escape_html(&entry.text)
        ));
    }
    out.push_str("</ul></nav>");
    out
}

/// Previous/next links following the reading order.
pub fn pager(prev: Option<&Document>, next: Option<&Document>, config: &SiteConfig) -> String {
    if prev.is_none() && next.is_none() {
        return String::new();
    }

    let mut out = String::from("<nav class=\"quire-pager\" aria-label=\"Docs pages\">");
    for (class, caption, doc) in [("prev", "Previous", prev), ("next", "Next", next)] {
        if let Some(doc) = doc {
            out.push_str(&format!(
                "<a class=\"{class}\" href=\"{}\"><small>{caption}</small>{}</a>",
                href(config, &doc.url),
                escape_html(doc.label())
            ));
        }
    }
    out.push_str("</nav>");
    out
}
