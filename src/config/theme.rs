//! `[theme]` section configuration.
//!
//! Controls color mode handling and the client-side search box.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[theme]` section in quire.toml.
///
/// # Example
/// ```toml
/// [theme]
/// dark_mode = true
/// disable_switch = false
///
/// [theme.search]
/// excerpt_length = 120
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    /// Start in dark mode.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub dark_mode: bool,

    /// Follow the visitor's `prefers-color-scheme` until they toggle.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub respect_prefers_color_scheme: bool,

    /// Hide the light/dark toggle button.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub disable_switch: bool,

    /// Search index and search box settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[theme.search]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Build `search-index.json` and show the search box.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Maximum characters kept per excerpt.
    #[serde(default = "defaults::theme::search::excerpt_length")]
    #[educe(Default = defaults::theme::search::excerpt_length())]
    pub excerpt_length: usize,

    /// Terms shorter than this (in characters) are not indexed.
    #[serde(default = "defaults::theme::search::min_term_length")]
    #[educe(Default = defaults::theme::search::min_term_length())]
    pub min_term_length: usize,

    /// Drop common English stop words.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub stop_words: bool,
}
