//! Documents and URL derivation.

use super::frontmatter::FrontMatter;
use crate::config::SlugMode;
use crate::utils::slug::{slugify_segment, split_number_prefix};
use std::path::{Component, Path, PathBuf};

/// Markdown file extensions.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx", "markdown"];

/// One markdown source file, immutable for the duration of a build.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute path of the source file.
    pub source: PathBuf,
    /// Path relative to the content root.
    pub rel_path: PathBuf,
    /// Directory relative to the content root (`""` for the root).
    pub dir: PathBuf,
    /// Raw file name, used by manifests and for tie-breaking.
    pub name: String,
    pub id: String,
    pub title: String,
    pub sidebar_label: Option<String>,
    /// Explicit slug from front-matter.
    pub slug: Option<String>,
    /// Resolved URL path with leading and trailing `/`, before `base_url`.
    pub url: String,
    pub position: Option<i64>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub draft: bool,
    /// `index.md` or `README.md`: the page of its directory.
    pub is_index: bool,
    pub body: String,
    pub body_line: usize,
}

impl Document {
    /// Assemble a document from its location and parsed front-matter.
    pub fn new(
        source: PathBuf,
        rel_path: PathBuf,
        meta: FrontMatter,
        body: String,
        body_line: usize,
        naming: &Naming,
    ) -> Self {
        let dir = rel_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = file_name(&rel_path);
        let stem = rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_index = is_index_stem(&stem);
        let (prefix_position, bare_stem) = naming.split(&stem);

        let url = match meta.slug.as_deref() {
            Some(slug) => slug_url(&naming.dir_url(&dir), slug),
            None if is_index => naming.dir_url(&dir),
            None => join_url(&naming.dir_url(&dir), &naming.segment(bare_stem)),
        };

        Self {
            id: meta.id.unwrap_or_else(|| bare_stem.to_owned()),
            title: meta.title.unwrap_or_else(|| bare_stem.to_owned()),
            sidebar_label: meta.sidebar_label,
            position: meta.sidebar_position.or(prefix_position),
            slug: meta.slug,
            description: meta.description,
            tags: meta.tags,
            draft: meta.draft,
            source,
            rel_path,
            dir,
            name,
            url,
            is_index,
            body,
            body_line,
        }
    }

    /// Text shown for this document in the sidebar.
    pub fn label(&self) -> &str {
        self.sidebar_label.as_deref().unwrap_or(&self.title)
    }
}

/// Naming rules shared by documents, categories and assets.
#[derive(Debug, Clone, Copy)]
pub struct Naming {
    pub number_prefixes: bool,
    pub slug: SlugMode,
}

impl Naming {
    /// Split a number prefix off `name` when prefixes are enabled.
    pub fn split<'a>(&self, name: &'a str) -> (Option<i64>, &'a str) {
        if self.number_prefixes {
            split_number_prefix(name)
        } else {
            (None, name)
        }
    }

    /// One URL segment for a file stem or directory name. A name the slug
    /// mode strips to nothing becomes `-`, never an empty segment.
    pub fn segment(&self, bare: &str) -> String {
        let slug = slugify_segment(bare, self.slug);
        if slug.is_empty() { "-".into() } else { slug }
    }

    /// URL of a content directory: `docs/01-js/closures` -> `/js/closures/`.
    pub fn dir_url(&self, dir: &Path) -> String {
        let mut url = String::from("/");
        for component in dir.components() {
            if let Component::Normal(segment) = component {
                let segment = segment.to_string_lossy();
                let (_, bare) = self.split(&segment);
                url.push_str(&self.segment(bare));
                url.push('/');
            }
        }
        url
    }
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn is_index_stem(stem: &str) -> bool {
    stem.eq_ignore_ascii_case("index") || stem.eq_ignore_ascii_case("readme")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `/js/` + `closures` -> `/js/closures/`
fn join_url(dir_url: &str, segment: &str) -> String {
    format!("{dir_url}{segment}/")
}

/// Absolute slugs resolve against `/`, relative ones against the directory.
/// Empty and `.` segments are dropped and `..` never climbs above the root,
/// so the URL names the page that is actually written.
fn slug_url(dir_url: &str, slug: &str) -> String {
    let slug = slug.trim();
    let base = if slug.starts_with('/') { "" } else { dir_url };

    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(slug.split('/')) {
        match segment.trim() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    if segments.is_empty() {
        "/".into()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMING: Naming = Naming {
        number_prefixes: true,
        slug: SlugMode::Safe,
    };

    fn doc(rel: &str, meta: FrontMatter) -> Document {
        Document::new(
            Path::new("/site/docs").join(rel),
            PathBuf::from(rel),
            meta,
            String::new(),
            1,
            &NAMING,
        )
    }

    #[test]
    fn test_url_from_path() {
        assert_eq!(doc("intro.md", FrontMatter::default()).url, "/intro/");
        assert_eq!(doc("01-js/02-closures.md", FrontMatter::default()).url, "/js/closures/");
        assert_eq!(doc("js/Event Loop.md", FrontMatter::default()).url, "/js/Event-Loop/");
    }

    #[test]
    fn test_index_and_readme_own_directory_url() {
        assert_eq!(doc("index.md", FrontMatter::default()).url, "/");
        assert_eq!(doc("01-js/README.md", FrontMatter::default()).url, "/js/");
        assert!(doc("css/index.mdx", FrontMatter::default()).is_index);
    }

    #[test]
    fn test_explicit_slugs() {
        let absolute = FrontMatter {
            slug: Some("/closures".into()),
            ..FrontMatter::default()
        };
        assert_eq!(doc("js/deep/a.md", absolute).url, "/closures/");

        let relative = FrontMatter {
            slug: Some("scope-chain".into()),
            ..FrontMatter::default()
        };
        let d = doc("js/a.md", relative);
        assert_eq!(d.url, "/js/scope-chain/");
        assert_eq!(d.slug.as_deref(), Some("scope-chain"));

        let root = FrontMatter {
            slug: Some("/".into()),
            ..FrontMatter::default()
        };
        assert_eq!(doc("welcome.md", root).url, "/");
    }

    #[test]
    fn test_slugs_are_normalised() {
        let slug = |value: &str| FrontMatter {
            slug: Some(value.into()),
            ..FrontMatter::default()
        };
        assert_eq!(doc("x.md", slug("/../etc")).url, "/etc/");
        assert_eq!(doc("js/a.md", slug("../css//./grid/")).url, "/css/grid/");
        assert_eq!(doc("js/a.md", slug("../../..")).url, "/");
        assert_eq!(doc("js/a.md", slug("./")).url, "/js/");
    }

    #[test]
    fn test_stem_stripped_to_nothing() {
        assert_eq!(NAMING.segment("()"), "-");
        assert_eq!(doc("().md", FrontMatter::default()).url, "/-/");
        assert_eq!(doc("()/a.md", FrontMatter::default()).url, "/-/a/");
    }

    #[test]
    fn test_title_id_and_position_defaults() {
        let d = doc("02-b.md", FrontMatter::default());
        assert_eq!(d.title, "b");
        assert_eq!(d.id, "b");
        assert_eq!(d.name, "02-b.md");
        assert_eq!(d.position, Some(2));
        assert_eq!(d.label(), "b");

        let meta = FrontMatter {
            id: Some("bee".into()),
            title: Some("Bees".into()),
            sidebar_label: Some("🐝".into()),
            sidebar_position: Some(7),
            ..FrontMatter::default()
        };
        let d = doc("02-b.md", meta);
        assert_eq!(d.id, "bee");
        assert_eq!(d.title, "Bees");
        assert_eq!(d.label(), "🐝");
        assert_eq!(d.position, Some(7));
    }

    #[test]
    fn test_number_prefixes_disabled() {
        let naming = Naming {
            number_prefixes: false,
            slug: SlugMode::On,
        };
        let d = Document::new(
            PathBuf::from("/x/01-Intro.md"),
            PathBuf::from("01-Intro.md"),
            FrontMatter::default(),
            String::new(),
            1,
            &naming,
        );
        assert_eq!(d.url, "/01-intro/");
        assert_eq!(d.position, None);
        assert_eq!(d.title, "01-Intro");
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("a.md")));
        assert!(is_markdown(Path::new("a.MDX")));
        assert!(is_markdown(Path::new("a.markdown")));
        assert!(!is_markdown(Path::new("a.png")));
        assert!(!is_markdown(Path::new("Makefile")));
    }
}
