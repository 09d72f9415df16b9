//! `[sidebar]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[sidebar]` section in quire.toml.
///
/// `order` is the manifest for the content root: ids or file names listed
/// here come first, in this order.
///
/// # Example
/// ```toml
/// [sidebar]
/// collapsed = false
/// order = ["intro", "javascript", "css"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SidebarConfig {
    /// Categories start collapsed unless they hold the current page.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub collapsed: bool,

    /// Root-level ordering manifest.
    #[serde(default)]
    pub order: Option<Vec<String>>,
}
