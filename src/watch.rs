//! File system watcher for `quire start`.
//!
//! Monitors the content directory, the static directory and the config file.
//! Every batch of changes triggers one full development rebuild; a
//! successful rebuild bumps the live-reload generation polled by the pages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Event Loop                          │
//! │                                                          │
//! │  ┌──────────┐    ┌──────────┐    ┌────────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│  handle_changes()  │  │
//! │  │ events   │    │ (300ms)  │    │                    │  │
//! │  └──────────┘    └──────────┘    │  config? reload    │  │
//! │                                  │  build_site(dev)   │  │
//! │                                  │  bump generation   │  │
//! │                                  └────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

use crate::{
    build::{Mode, build_site},
    config::{SiteConfig, cfg, reload_config},
    log,
    logger::WatchStatus,
    utils::category::{FileCategory, categorize_path},
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;

/// Incremented after every successful rebuild.
static GENERATION: AtomicU64 = AtomicU64::new(0);

/// Current live-reload generation.
pub fn generation() -> u64 {
    GENERATION.load(Ordering::Acquire)
}

fn bump_generation() -> u64 {
    GENERATION.fetch_add(1, Ordering::AcqRel) + 1
}

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// `/proj/docs/js/closures.md` → `docs/js/closures.md`
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events into one rebuild.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    /// Pending paths in a stable order.
    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// What a batch of changed paths asks for.
#[derive(Debug, Default, PartialEq, Eq)]
struct ChangeSet {
    config: bool,
    /// Relative paths of changed content and static files
    files: Vec<String>,
}

impl ChangeSet {
    fn from_paths(paths: &[PathBuf], config: &SiteConfig) -> Self {
        let root = config.get_root();
        let mut changes = Self::default();
        for path in paths {
            match categorize_path(path, config) {
                FileCategory::Config => changes.config = true,
                FileCategory::Content | FileCategory::Static => changes.files.push(rel_path(path, root)),
                FileCategory::Unknown => {}
            }
        }
        changes
    }

    fn is_empty(&self) -> bool {
        !self.config && self.files.is_empty()
    }

    /// Short description for the status line.
    fn describe(&self) -> String {
        match self.files.as_slice() {
            [] => "config".to_string(),
            [one] => one.clone(),
            [first, rest @ ..] => format!("{first} and {} more", rest.len()),
        }
    }
}

/// Reload config if needed, then rebuild.
fn handle_changes(paths: &[PathBuf], status: &mut WatchStatus) {
    let changes = ChangeSet::from_paths(paths, &cfg());
    if changes.is_empty() {
        return;
    }

    if changes.config {
        match reload_config() {
            Ok(true) => log!("config"; "reloaded"),
            Ok(false) if changes.files.is_empty() => return,
            Ok(false) => {}
            Err(err) => {
                status.error("config error, keeping previous config", &format!("{err:#}"));
                return;
            }
        }
    }

    rebuild(&changes.describe(), status);
}

fn rebuild(trigger: &str, status: &mut WatchStatus) {
    let config = cfg();
    match build_site(&config, Mode::Development) {
        Ok(summary) => {
            let generation = bump_generation();
            if summary.failed.is_empty() {
                status.success(&format!(
                    "{trigger}: rebuilt {} pages (#{generation})",
                    summary.pages
                ));
            } else {
                let detail = summary
                    .failed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n");
                status.error(
                    &format!("{trigger}: {} document(s) failed", summary.failed.len()),
                    &detail,
                );
            }
        }
        Err(err) => status.error(&format!("{trigger}: build failed"), &err.to_string()),
    }
}

// =============================================================================
// Watcher Setup
// =============================================================================

/// Existing paths to watch.
fn watch_targets(config: &SiteConfig) -> Vec<(FileCategory, &Path)> {
    [
        (FileCategory::Content, config.build.content.as_path()),
        (FileCategory::Static, config.build.static_dir.as_path()),
        (FileCategory::Config, config.config_path.as_path()),
    ]
    .into_iter()
    .filter(|(_, path)| path.exists())
    .collect()
}

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    let root = config.get_root();
    let mut watched = Vec::new();
    for (category, path) in watch_targets(config) {
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(path, mode)
            .with_context(|| format!("Failed to watch {}: {}", category.name(), path.display()))?;
        watched.push(format!("{} ({})", rel_path(path, root), category.name()));
    }

    log!("watch"; "{}", watched.join(", "));
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing and live rebuild.
pub fn watch_for_changes_blocking() -> Result<()> {
    let config = cfg();
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, &config)?;
    drop(config);

    let mut debouncer = Debouncer::new();
    let mut status = WatchStatus::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(&debouncer.take(), &mut status);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn config_at(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.set_root(root);
        config.config_path = root.join("quire.toml");
        config.build.content = root.join("docs");
        config.build.static_dir = root.join("static");
        config.build.output = root.join(".quire/dev");
        config.build.cache = root.join(".quire");
        config
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("docs/a.md~")));
        assert!(is_temp_file(Path::new("docs/.a.md.swp")));
        assert!(is_temp_file(Path::new("docs/a.bak")));
        assert!(!is_temp_file(Path::new("docs/a.md")));
    }

    #[test]
    fn test_debouncer_batches_events() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));

        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/site/docs/b.md"))
            .add_path(PathBuf::from("/site/docs/a.md"))
            .add_path(PathBuf::from("/site/docs/a.md~"));
        debouncer.add(event);
        debouncer.add(
            Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("/site/docs/a.md")),
        );
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));

        debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS));
        assert!(debouncer.ready());
        assert_eq!(
            debouncer.take(),
            vec![PathBuf::from("/site/docs/a.md"), PathBuf::from("/site/docs/b.md")]
        );
        assert!(!debouncer.ready());
    }

    #[test]
    fn test_change_set_ignores_output_writes() {
        let root = Path::new("/site");
        let config = config_at(root);
        let paths = [
            root.join(".quire/dev/index.html"),
            root.join("docs/js/closures.md"),
            root.join("static/logo.svg"),
            root.join("README.md"),
        ];
        let changes = ChangeSet::from_paths(&paths, &config);

        assert!(!changes.config);
        assert_eq!(changes.files, vec!["docs/js/closures.md", "static/logo.svg"]);
        assert_eq!(changes.describe(), "docs/js/closures.md and 1 more");

        let changes = ChangeSet::from_paths(&[root.join(".quire/dev/a/index.html")], &config);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_change_set_config() {
        let root = Path::new("/site");
        let config = config_at(root);
        let changes = ChangeSet::from_paths(&[root.join("quire.toml")], &config);
        assert!(changes.config);
        assert_eq!(changes.describe(), "config");
    }

    #[test]
    fn test_watch_targets_skip_missing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("quire.toml"), "").unwrap();

        let config = config_at(root);
        let docs = root.join("docs");
        let toml = root.join("quire.toml");
        assert_eq!(
            watch_targets(&config),
            vec![
                (FileCategory::Content, docs.as_path()),
                (FileCategory::Config, toml.as_path()),
            ]
        );
    }

    #[test]
    fn test_relevant_events() {
        assert!(is_relevant(&Event::new(EventKind::Create(CreateKind::File))));
        assert!(!is_relevant(&Event::new(EventKind::Access(
            notify::event::AccessKind::Any
        ))));
    }

    #[test]
    fn test_generation_increases() {
        let before = generation();
        let after = bump_generation();
        assert!(after > before);
        assert!(generation() >= after);
    }
}
