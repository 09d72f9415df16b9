//! `[base]` section configuration.
//!
//! Contains basic site information like title, URL and hosting identifiers.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in quire.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "Frontend Interview Notes"
/// tagline = "Everything I keep forgetting"
/// url = "https://alice.github.io"
/// base_url = "/notes/"
/// organization = "alice"
/// project = "notes"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title displayed in browser tab and navbar.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,

    /// Short description shown on the landing page.
    #[serde(default)]
    pub tagline: String,

    /// Absolute site URL (scheme + host) for sitemap entries.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// Path prefix every page and asset link is served under.
    #[serde(default = "defaults::base::base_url")]
    #[educe(Default = defaults::base::base_url())]
    pub base_url: String,

    /// Hosting organization (e.g. GitHub user or org). Informational only.
    #[serde(default)]
    pub organization: String,

    /// Hosting project (e.g. repository name). Informational only.
    #[serde(default)]
    pub project: String,

    /// BCP 47 language code (e.g., "en", "zh-Hans").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,

    /// Copyright notice for site footer.
    #[serde(default)]
    pub copyright: String,
}
