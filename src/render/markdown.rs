//! Markdown to HTML.
//!
//! `pulldown-cmark` does the parsing and HTML writing. Code blocks and
//! headings are intercepted and emitted as raw HTML, links are rewritten
//! through a [`LinkResolver`].

use super::links::LinkResolver;
use crate::utils::{html::escape_html, slug::slugify_fragment};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use rustc_hash::FxHashMap;

/// Table-of-contents entry (h2 and h3 only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Output of [`render`].
#[derive(Debug, Default)]
pub struct Rendered {
    pub html: String,
    pub toc: Vec<TocEntry>,
    /// Markdown links that name no known document.
    pub broken_links: Vec<String>,
}

pub fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

/// Render container-expanded markdown.
pub fn render(source: &str, links: &LinkResolver<'_>) -> Rendered {
    let mut broken_links = Vec::new();
    let events = Parser::new_ext(source, parser_options()).map(|event| match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = rewrite(&dest_url, links, &mut broken_links);
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = rewrite(&dest_url, links, &mut broken_links);
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    });

    let mut writer = Writer::default();
    for event in events {
        writer.push(event);
    }

    Rendered {
        html: writer.finish(),
        toc: writer.toc,
        broken_links,
    }
}

fn rewrite(dest: &str, links: &LinkResolver<'_>, broken: &mut Vec<String>) -> CowStr<'static> {
    match links.resolve(dest) {
        Ok(url) => url.into(),
        Err(original) => {
            broken.push(original.clone());
            original.into()
        }
    }
}

// ============================================================================
// Event writer
// ============================================================================

/// Block currently being buffered.
enum Capture<'a> {
    None,
    Code {
        lang: Option<String>,
        title: Option<String>,
        text: String,
    },
    Heading {
        level: HeadingLevel,
        id: Option<String>,
        classes: Vec<String>,
        events: Vec<Event<'a>>,
        text: String,
    },
}

#[derive(Default)]
struct Writer<'a> {
    events: Vec<Event<'a>>,
    capture: Option<Capture<'a>>,
    ids: FxHashMap<String, usize>,
    toc: Vec<TocEntry>,
}

impl<'a> Writer<'a> {
    fn push(&mut self, event: Event<'a>) {
        match (self.capture.take().unwrap_or(Capture::None), event) {
            (Capture::None, Event::Start(Tag::CodeBlock(kind))) => {
                let (lang, title) = match &kind {
                    CodeBlockKind::Fenced(info) => parse_fence_info(info),
                    CodeBlockKind::Indented => (None, None),
                };
                self.capture = Some(Capture::Code {
                    lang,
                    title,
                    text: String::new(),
                });
            }
            (Capture::None, Event::Start(Tag::Heading { level, id, classes, .. })) => {
                self.capture = Some(Capture::Heading {
                    level,
                    id: id.map(|id| id.to_string()),
                    classes: classes.iter().map(ToString::to_string).collect(),
                    events: Vec::new(),
                    text: String::new(),
                });
            }
            (Capture::None, event) => self.events.push(event),

            (Capture::Code { lang, title, text }, Event::End(TagEnd::CodeBlock)) => {
                let html = code_block_html(lang.as_deref(), title.as_deref(), &text);
                self.events.push(Event::Html(html.into()));
            }
            (Capture::Code { lang, title, mut text }, Event::Text(chunk)) => {
                text.push_str(&chunk);
                self.capture = Some(Capture::Code { lang, title, text });
            }
            (code @ Capture::Code { .. }, _) => self.capture = Some(code),

            (
                Capture::Heading {
                    level,
                    id,
                    classes,
                    events,
                    text,
                },
                Event::End(TagEnd::Heading(_)),
            ) => {
                let html = self.heading_html(level, id, &classes, events, &text);
                self.events.push(Event::Html(html.into()));
            }
            (
                Capture::Heading {
                    level,
                    id,
                    classes,
                    mut events,
                    mut text,
                },
                event,
            ) => {
                if let Event::Text(chunk) | Event::Code(chunk) = &event {
                    text.push_str(chunk);
                }
                events.push(event);
                self.capture = Some(Capture::Heading {
                    level,
                    id,
                    classes,
                    events,
                    text,
                });
            }
        }
    }

    fn heading_html(
        &mut self,
        level: HeadingLevel,
        explicit_id: Option<String>,
        classes: &[String],
        events: Vec<Event<'a>>,
        text: &str,
    ) -> String {
        let level = heading_level_to_num(level);
        let text = text.trim();
        let base = explicit_id.unwrap_or_else(|| {
            let slug = slugify_fragment(text);
            if slug.is_empty() { "section".into() } else { slug }
        });
        let id = self.unique_id(base);

        if level == 2 || level == 3 {
            self.toc.push(TocEntry {
                level,
                id: id.clone(),
                text: text.to_owned(),
            });
        }

        let mut inner = String::new();
        html::push_html(&mut inner, events.into_iter());
        let class = if classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", escape_html(&classes.join(" ")))
        };
        let id = escape_html(&id);
        format!(
            "<h{level} id=\"{id}\"{class}>{inner}<a class=\"hash-link\" href=\"#{id}\" aria-label=\"Direct link to {}\">#</a></h{level}>\n",
            escape_html(text)
        )
    }

    /// `intro`, `intro-1`, `intro-2`, ...
    fn unique_id(&mut self, base: String) -> String {
        let count = self.ids.entry(base.clone()).or_insert(0);
        let id = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        id
    }

    fn finish(&mut self) -> String {
        // An unterminated code block at end of input still renders
        if let Some(Capture::Code { lang, title, text }) = self.capture.take() {
            let html = code_block_html(lang.as_deref(), title.as_deref(), &text);
            self.events.push(Event::Html(html.into()));
        }
        let mut out = String::new();
        html::push_html(&mut out, std::mem::take(&mut self.events).into_iter());
        out
    }
}

/// Code block markup. The body is HTML-escaped and otherwise verbatim.
fn code_block_html(lang: Option<&str>, title: Option<&str>, text: &str) -> String {
    let mut out = String::from("<div class=\"quire-code\">");
    if let Some(title) = title {
        out.push_str("<div class=\"quire-code-title\">");
        out.push_str(&escape_html(title));
        out.push_str("</div>");
    }
    match lang {
        Some(lang) => {
            out.push_str("<pre><code class=\"language-");
            out.push_str(&escape_html(lang));
            out.push_str("\">");
        }
        None => out.push_str("<pre><code>"),
    }
    out.push_str(&escape_html(text));
    out.push_str("</code></pre></div>\n");
    out
}

/// `js title="event loop.js" {1,3}` -> (`js`, `event loop.js`)
fn parse_fence_info(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    let (lang, rest) = info.split_once(char::is_whitespace).unwrap_or((info, ""));
    let lang = (!lang.is_empty() && !lang.contains('=')).then(|| lang.to_owned());
    let rest = if lang.is_none() { info } else { rest };

    let title = rest.find("title=").and_then(|at| {
        let value = &rest[at + "title=".len()..];
        match value.chars().next() {
            Some(quote @ ('"' | '\'')) => value[1..].split(quote).next().map(str::to_owned),
            Some(_) => value.split_whitespace().next().map(str::to_owned),
            None => None,
        }
    });
    (lang, title)
}

const fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
