//! Terminal output.
//!
//! Three things write to the terminal:
//!
//! - `log!("build"; "...")` prints one line with a colored module prefix
//! - [`RenderProgress`] shows a single bar while documents render
//! - [`WatchStatus`] keeps the rebuild result of `quire start` on one block
//!
//! ```text
//! [content] skipped 3 drafts
//! [render] [██████████░░░░░░░░░░] 21/42
//! ```
//!
//! A log line printed while the bar is visible lands above the bar; the bar
//! is redrawn below it.

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

static TERMINAL_WIDTH: OnceLock<usize> = OnceLock::new();

/// Set while a [`RenderProgress`] occupies the last terminal line.
static BAR_VISIBLE: AtomicBool = AtomicBool::new(false);

/// Serializes writers sharing the terminal.
static TERMINAL: Mutex<()> = Mutex::new(());

const BAR_MODULE: &str = "render";
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map_or(120, |(w, _)| w as usize))
}

// ============================================================================
// log!
// ============================================================================

/// Print a message with a colored `[module]` prefix.
///
/// ```ignore
/// log!("content"; "skipped {} drafts", content.skipped_drafts);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

pub fn log(module: &str, message: &str) {
    let _guard = TERMINAL.lock().ok();
    let mut stdout = stdout().lock();

    if BAR_VISIBLE.load(Ordering::Acquire) {
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }

    // Multi-line messages (error details) are printed whole
    let message = if message.contains('\n') {
        message
    } else {
        fit(message, terminal_width().saturating_sub(module.len() + 3))
    };
    // The bar redraws on the fresh line below on its next tick
    writeln!(stdout, "{} {message}", prefix(module)).ok();
    stdout.flush().ok();
}

fn prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module {
        "serve" | "watch" => prefix.bright_blue().bold(),
        "error" => prefix.bright_red().bold(),
        "warn" | "nav" => prefix.bright_magenta().bold(),
        "build" | "init" | "clear" => prefix.bright_cyan().bold(),
        BAR_MODULE => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Longest prefix of `message` within `max` bytes, on a char boundary.
fn fit(message: &str, max: usize) -> &str {
    if message.len() <= max {
        return message;
    }
    let end = (0..=max).rev().find(|i| message.is_char_boundary(*i)).unwrap_or(0);
    &message[..end]
}

// ============================================================================
// Render progress
// ============================================================================

/// Progress of the render phase, redrawn in place on the last line.
///
/// `tick` may be called from rayon workers. The line is cleared on drop.
pub struct RenderProgress {
    total: usize,
    done: AtomicUsize,
}

impl RenderProgress {
    /// `None` for zero or one document, where a bar would only flicker.
    pub fn start(total: usize) -> Option<Self> {
        if total <= 1 {
            return None;
        }
        let progress = Self {
            total,
            done: AtomicUsize::new(0),
        };
        BAR_VISIBLE.store(true, Ordering::Release);
        progress.draw(0);
        Some(progress)
    }

    /// Count one rendered document.
    pub fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        self.draw(done.min(self.total));
    }

    fn draw(&self, done: usize) {
        let _guard = TERMINAL.lock().ok();
        let mut stdout = stdout().lock();
        let line = bar_line(done, self.total, terminal_width());
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} {line}", prefix(BAR_MODULE)).ok();
        stdout.flush().ok();
    }
}

impl Drop for RenderProgress {
    fn drop(&mut self) {
        let _guard = TERMINAL.lock().ok();
        BAR_VISIBLE.store(false, Ordering::Release);
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}

/// `[████░░░░] 21/42`, sized to the space left after `[render] `.
fn bar_line(done: usize, total: usize, width: usize) -> String {
    let count = format!("{done}/{total}");
    let overhead = BAR_MODULE.len() + 3 + 3 + count.len();
    let bar_width = width.saturating_sub(overhead).clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
    let filled = if total == 0 { 0 } else { done * bar_width / total };
    format!(
        "[{}{}] {count}",
        "█".repeat(filled),
        "░".repeat(bar_width - filled)
    )
}

// ============================================================================
// Watch status
// ============================================================================

/// Rebuild result of `quire start`, replacing the previous one in place.
///
/// ```ignore
/// status.success("docs/js/closures.md: rebuilt 42 pages (#3)");
/// status.error("docs/js/this.md: 1 document(s) failed", "docs/js/this.md:12: unclosed container");
/// ```
pub struct WatchStatus {
    /// Lines printed by the previous status.
    last_lines: usize,
}

impl WatchStatus {
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    pub fn success(&mut self, message: &str) {
        self.show(&"✓".green(), message);
    }

    /// Summary on the first line, `detail` (one failure per line) below it.
    pub fn error(&mut self, summary: &str, detail: &str) {
        if detail.is_empty() {
            self.show(&"✗".red(), summary);
        } else {
            self.show(&"✗".red(), &format!("{summary}\n{detail}"));
        }
    }

    fn show(&mut self, symbol: &ColoredString, message: &str) {
        let _guard = TERMINAL.lock().ok();
        let mut stdout = stdout().lock();

        if let Ok(lines) = u16::try_from(self.last_lines)
            && lines > 0
        {
            execute!(stdout, cursor::MoveUp(lines), Clear(ClearType::FromCursorDown)).ok();
        }

        let time = format!("[{}]", chrono::Local::now().format("%H:%M:%S"));
        writeln!(stdout, "{} {symbol} {message}", time.dimmed()).ok();
        stdout.flush().ok();

        self.last_lines = line_count(message);
    }
}

fn line_count(message: &str) -> usize {
    message.lines().count().max(1)
}
