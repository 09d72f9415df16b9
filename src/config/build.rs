//! `[build]` section configuration.
//!
//! Contains build settings including paths, minification, slugs and exclusions.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Enums
// ============================================================================

/// URL slug generation mode for path segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Always convert to an ASCII slug (e.g., "你好 World" → "ni-hao-world").
    On,
    /// Strip URL-hostile characters, keep everything else (default).
    #[default]
    Safe,
    /// No slugification; preserve original text.
    No,
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in quire.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "docs"         # Source directory
/// output = "build"         # Output directory
/// minify = true            # Minify HTML
/// exclude = ["**/drafts/**"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root", skip_serializing)]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content source directory (markdown files).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Static files copied verbatim to the output root.
    #[serde(default = "defaults::build::static_dir")]
    #[educe(Default = defaults::build::static_dir())]
    pub static_dir: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Cache directory holding the staging area and development builds.
    #[serde(default = "defaults::build::cache")]
    #[educe(Default = defaults::build::cache())]
    pub cache: PathBuf,

    /// Minify HTML output.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Generate `sitemap.xml` (requires `[base] url`).
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub sitemap: bool,

    /// Include `draft: true` documents in production builds.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// Treat `01-` style name prefixes as sidebar positions.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub number_prefixes: bool,

    /// Slug mode for URL path segments.
    #[serde(default = "defaults::build::slug::mode")]
    #[educe(Default = defaults::build::slug::mode())]
    pub slug: SlugMode,

    /// Glob patterns (relative to the content root) of files to leave out.
    #[serde(default)]
    pub exclude: Vec<String>,
}
