//! Local HTTP server for built output.
//!
//! Built on `tiny_http`:
//!
//! - Static file serving from the output directory, below `base_url`
//! - Automatic `index.html` resolution for directories
//! - The site's own `404.html` for misses
//! - A live-reload endpoint reporting the current build generation
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (quire start)   │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!    serve files             rebuild site
//!    report generation ◄──── bump generation
//! ```

use crate::{
    config::{SiteConfig, cfg},
    log,
    render::layout::RELOAD_ENDPOINT,
    watch,
};
use anyhow::{Context, Result};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

const NOT_FOUND_PAGE: &str = "404.html";

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve the output directory until Ctrl+C.
///
/// With `live_reload` set, a watcher thread rebuilds the site on change and
/// pages poll [`RELOAD_ENDPOINT`] for the new generation.
pub fn serve_site(live_reload: bool) -> Result<()> {
    let c = cfg();
    let interface: IpAddr = c
        .serve
        .interface
        .parse()
        .with_context(|| format!("invalid [serve] interface `{}`", c.serve.interface))?;

    let (server, addr) = try_bind_port(interface, c.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}{}", addr, c.base.base_url);

    if live_reload && c.serve.watch {
        std::thread::spawn(|| {
            if let Err(err) = watch::watch_for_changes_blocking() {
                log!("watch"; "{err}");
            }
        });
    }

    for request in server.incoming_requests() {
        // Re-load config on each request to pick up hot-reloaded changes
        if let Err(e) = handle_request(request, &cfg(), live_reload) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Resolution
// ============================================================================

/// What a request path maps to.
#[derive(Debug, PartialEq, Eq)]
enum Resolved {
    File(PathBuf),
    /// Live-reload poll
    Generation,
    /// Miss; carries the site's 404 page when one exists
    NotFound(Option<PathBuf>),
}

/// Map a raw request URL onto the output directory.
///
/// Resolution order:
/// 1. Live-reload endpoint (when enabled)
/// 2. Exact file below `base_url`
/// 3. Directory with `index.html`
/// 4. `404.html` of the site, or a plain 404
fn resolve(raw_url: &str, config: &SiteConfig, live_reload: bool) -> Resolved {
    let root = &config.build.output;

    // Strip query string (e.g., ?t=123456) before resolving path
    let path = raw_url.split(['?', '#']).next().unwrap_or_default();
    let path = urlencoding::decode(path)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    if live_reload && path == RELOAD_ENDPOINT {
        return Resolved::Generation;
    }

    let not_found = || {
        let page = root.join(NOT_FOUND_PAGE);
        Resolved::NotFound(page.is_file().then_some(page))
    };

    let Some(rel) = strip_base(&path, &config.base.base_url) else {
        return not_found();
    };
    let Some(rel) = safe_relative(rel) else {
        return not_found();
    };

    let local = root.join(rel);
    if local.is_file() {
        return Resolved::File(local);
    }
    let index = local.join("index.html");
    if local.is_dir() && index.is_file() {
        return Resolved::File(index);
    }
    not_found()
}

/// `/notes/js/a/` below `/notes/` is `js/a/`. `/notes` alone is the root.
fn strip_base<'a>(path: &'a str, base_url: &str) -> Option<&'a str> {
    if let Some(rest) = path.strip_prefix(base_url) {
        return Some(rest);
    }
    (path == base_url.trim_end_matches('/')).then_some("")
}

/// Reject `..` and absolute components so requests stay inside the root.
fn safe_relative(rel: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

// ============================================================================
// Request Handling
// ============================================================================

fn handle_request(request: Request, config: &SiteConfig, live_reload: bool) -> Result<()> {
    match resolve(request.url(), config, live_reload) {
        Resolved::File(path) => serve_file(request, &path, StatusCode(200)),
        Resolved::Generation => serve_generation(request),
        Resolved::NotFound(Some(page)) => serve_file(request, &page, StatusCode(404)),
        Resolved::NotFound(None) => serve_not_found(request),
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name, value).map_err(|()| anyhow::anyhow!("invalid header `{name}: {value}`"))
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path, status: StatusCode) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content)
        .with_status_code(status)
        .with_header(header("Content-Type", guess_content_type(path))?);

    request.respond(response)?;
    Ok(())
}

fn serve_generation(request: Request) -> Result<()> {
    let response = Response::from_string(watch::generation().to_string())
        .with_header(header("Content-Type", "text/plain; charset=utf-8")?)
        .with_header(header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![header("Content-Type", "text/plain")?],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",

        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn site(root: &Path, base_url: &str) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.output = root.to_path_buf();
        config.base.base_url = base_url.into();
        config
    }

    fn write(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, rel).unwrap();
        path
    }

    #[test]
    fn test_resolve_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let index = write(root, "index.html");
        let page = write(root, "js/closures/index.html");
        let css = write(root, "assets/quire.css");
        let config = site(root, "/");

        assert_eq!(resolve("/", &config, false), Resolved::File(index));
        assert_eq!(resolve("/js/closures/", &config, false), Resolved::File(page.clone()));
        assert_eq!(resolve("/js/closures", &config, false), Resolved::File(page));
        assert_eq!(resolve("/assets/quire.css?v=1", &config, false), Resolved::File(css));
    }

    #[test]
    fn test_resolve_under_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let index = write(root, "index.html");
        let page = write(root, "a/index.html");
        let config = site(root, "/notes/");

        assert_eq!(resolve("/notes/", &config, false), Resolved::File(index.clone()));
        assert_eq!(resolve("/notes", &config, false), Resolved::File(index));
        assert_eq!(resolve("/notes/a/", &config, false), Resolved::File(page));
        assert_eq!(resolve("/a/", &config, false), Resolved::NotFound(None));
    }

    #[test]
    fn test_resolve_missing_uses_site_404() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let config = site(root, "/");
        assert_eq!(resolve("/missing/", &config, false), Resolved::NotFound(None));

        let page = write(root, "404.html");
        assert_eq!(resolve("/missing/", &config, false), Resolved::NotFound(Some(page)));
    }

    #[test]
    fn test_resolve_rejects_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        write(dir.path(), "secret.txt");
        let config = site(&root, "/");

        assert_eq!(resolve("/../secret.txt", &config, false), Resolved::NotFound(None));
        assert_eq!(resolve("/%2e%2e/secret.txt", &config, false), Resolved::NotFound(None));
    }

    #[test]
    fn test_resolve_percent_encoded_paths() {
        let dir = tempfile::tempdir().unwrap();
        let page = write(dir.path(), "面试/index.html");
        let config = site(dir.path(), "/");
        assert_eq!(
            resolve("/%E9%9D%A2%E8%AF%95/", &config, false),
            Resolved::File(page)
        );
    }

    #[test]
    fn test_reload_endpoint_only_with_live_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config = site(dir.path(), "/notes/");
        assert_eq!(resolve(RELOAD_ENDPOINT, &config, true), Resolved::Generation);
        assert_eq!(resolve(RELOAD_ENDPOINT, &config, false), Resolved::NotFound(None));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("search-index.json")), "application/json; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(guess_content_type(Path::new("CNAME")), "application/octet-stream");
    }
}
