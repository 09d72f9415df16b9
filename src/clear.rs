//! `quire clear`: remove generated files.

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Remove the cache directory and the output directory.
///
/// Returns how many of the two existed. Missing directories are not an error.
pub fn clear_site(config: &SiteConfig) -> Result<usize> {
    let root = config.get_root();
    let mut removed = 0;
    for dir in [&config.build.cache, &config.build.output] {
        if remove_dir(dir)? {
            log!("clear"; "removed {}", dir.strip_prefix(root).unwrap_or(dir).display());
            removed += 1;
        }
    }
    Ok(removed)
}

fn remove_dir(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    Ok(true)
}
