//! Front-matter extraction.
//!
//! A document may open with a YAML block fenced by `---` lines or a TOML
//! block fenced by `+++` lines:
//!
//! ```text
//! ---
//! title: Closures
//! sidebar_position: 2
//! tags: [javascript, scope]
//! ---
//! # body starts here
//! ```

use crate::error::SiteError;
use serde::Deserialize;
use std::path::Path;

/// Metadata recognised in a document's front-matter. Unknown keys are ignored.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub id: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(alias = "sidebarPosition")]
    pub sidebar_position: Option<i64>,
    #[serde(alias = "sidebarLabel")]
    pub sidebar_label: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub draft: bool,
}

/// Result of splitting a source file.
#[derive(Debug)]
pub struct Parsed<'a> {
    pub meta: FrontMatter,
    pub body: &'a str,
    /// 1-based line number of the first body line in the source file.
    pub body_line: usize,
}

#[derive(Clone, Copy)]
enum Format {
    Yaml,
    Toml,
}

impl Format {
    const fn delimiter(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Split `source` into front-matter and body.
///
/// Files without a leading delimiter have default metadata and the whole
/// text as body. Malformed blocks are configuration errors carrying `path`
/// and the offending line.
pub fn parse<'a>(source: &'a str, path: &Path) -> Result<Parsed<'a>, SiteError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let first_line = source.lines().next().unwrap_or("").trim_end();
    let format = match first_line {
        "---" => Format::Yaml,
        "+++" => Format::Toml,
        _ => {
            return Ok(Parsed {
                meta: FrontMatter::default(),
                body: source,
                body_line: 1,
            });
        }
    };

    // Byte offset just past the opening delimiter line
    let block_start = source.find('\n').map_or(source.len(), |i| i + 1);
    let mut offset = block_start;
    let mut line_no = 2;
    let mut closing = None;
    for line in source[block_start..].split_inclusive('\n') {
        if line.trim_end() == format.delimiter() {
            closing = Some((offset, offset + line.len(), line_no));
            break;
        }
        offset += line.len();
        line_no += 1;
    }

    let Some((block_end, body_start, closing_line)) = closing else {
        return Err(SiteError::configuration(
            path,
            Some(1),
            format!("unterminated front-matter block (missing closing `{}`)", format.delimiter()),
        ));
    };

    let block = &source[block_start..block_end];
    let meta = match format {
        Format::Yaml => parse_yaml(block, path)?,
        Format::Toml => parse_toml(block, path)?,
    };

    Ok(Parsed {
        meta,
        body: &source[body_start..],
        body_line: closing_line + 1,
    })
}

fn parse_yaml(block: &str, path: &Path) -> Result<FrontMatter, SiteError> {
    let is_blank = block
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'));
    if is_blank {
        return Ok(FrontMatter::default());
    }

    serde_yaml::from_str(block).map_err(|err| {
        // The block starts on line 2 of the file
        let line = err.location().map(|loc| loc.line() + 1);
        SiteError::configuration(path, line, format!("invalid YAML front-matter: {err}"))
    })
}

fn parse_toml(block: &str, path: &Path) -> Result<FrontMatter, SiteError> {
    toml::from_str(block).map_err(|err| {
        let line = err
            .span()
            .map(|span| block[..span.start.min(block.len())].matches('\n').count() + 2);
        SiteError::configuration(path, line, format!("invalid TOML front-matter: {}", err.message()))
    })
}
