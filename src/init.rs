//! Site initialization module.
//!
//! Creates a new site with a default configuration and a first document.

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore"];

const INTRO_DOC: &str = "\
---
title: Introduction
sidebar_position: 1
---

# Introduction

Welcome to your notes. Every markdown file under `docs/` becomes a page,
and every directory becomes a sidebar category.

:::tip Next steps
Run `quire start` and edit this file to see the page reload.
:::
";

/// Create a new site at the configured root.
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    // Without a name the current directory is the site and must be empty
    if !is_dir_empty(root)? {
        if has_name {
            bail!("`{}` already exists and is not empty.", root.display());
        }
        bail!("Current directory is not empty. Use `quire init <SITE_NAME>` to create in a subdirectory.");
    }

    init_site_structure(config)?;
    init_default_config(config, root)?;
    init_ignored_files(root, &[&config.build.output, &config.build.cache])?;

    log!("init"; "created site at {}", root.display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file, titled after the site directory.
fn init_default_config(config: &SiteConfig, root: &Path) -> Result<()> {
    let mut site = SiteConfig::default();
    if let Some(name) = root.file_name().and_then(|n| n.to_str()) {
        site.base.title = name.to_owned();
    }

    let content = toml::to_string_pretty(&site)?;
    fs::write(&config.config_path, content)
        .with_context(|| format!("Failed to write {}", config.config_path.display()))?;
    Ok(())
}

/// Create content and static directories plus a first document.
fn init_site_structure(config: &SiteConfig) -> Result<()> {
    for dir in [&config.build.content, &config.build.static_dir] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let intro = config.build.content.join("intro.md");
    fs::write(&intro, INTRO_DOC).with_context(|| format!("Failed to write {}", intro.display()))?;
    Ok(())
}

/// Write ignore files listing `paths` relative to the root.
fn init_ignored_files(root: &Path, paths: &[&Path]) -> Result<()> {
    let mut content = paths
        .iter()
        .map(|p| p.strip_prefix(root).unwrap_or(p))
        .filter_map(|p| p.to_str())
        .map(|p| format!("/{p}/"))
        .collect::<Vec<_>>()
        .join("\n");
    content.push('\n');

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{Mode, build_site};
    use pretty_assertions::assert_eq;

    fn config_at(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.set_root(root);
        config.config_path = root.join("quire.toml");
        config.build.content = root.join("docs");
        config.build.static_dir = root.join("static");
        config.build.output = root.join("build");
        config.build.cache = root.join(".quire");
        config
    }

    #[test]
    fn test_new_site_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("interview-notes");
        let config = config_at(&root);

        new_site(&config, true).unwrap();

        assert!(root.join("docs/intro.md").is_file());
        assert!(root.join("static").is_dir());
        assert_eq!(
            fs::read_to_string(root.join(".gitignore")).unwrap(),
            "/build/\n/.quire/\n"
        );

        let written = SiteConfig::from_path(&root.join("quire.toml")).unwrap();
        assert_eq!(written.base.title, "interview-notes");
        assert_eq!(written.base.base_url, "/");
        written.validate().unwrap();
    }

    #[test]
    fn test_new_site_refuses_non_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), "x").unwrap();
        let config = config_at(dir.path());

        let err = new_site(&config, false).unwrap_err();
        assert!(err.to_string().contains("not empty"));
        assert!(!dir.path().join("quire.toml").exists());
    }

    #[test]
    fn test_scaffold_builds() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        let mut config = config_at(&root);
        config.build.minify = false;
        new_site(&config, true).unwrap();

        let summary = build_site(&config, Mode::Production).unwrap();
        assert_eq!(summary.pages, 1);
        assert!(summary.failed.is_empty());
        let html = fs::read_to_string(root.join("build/intro/index.html")).unwrap();
        assert!(html.contains("Next steps"));
    }
}
