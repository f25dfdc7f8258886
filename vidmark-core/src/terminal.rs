//! Terminal UI components and styling for vidmark.
//!
//! This module provides consistent terminal output styling using a hierarchical
//! system with minimal symbols and consistent spacing. Everything goes through
//! the `log` facade so the same lines reach the console and the run log, except
//! the frame progress bar, which draws on stderr only when it is a terminal.

use console::{Term, style};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::sync::{LazyLock, Mutex};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// Represents the visual hierarchy levels in the CLI output
#[derive(Debug, Clone, Copy)]
pub enum OutputLevel {
    /// Level 1: Main sections (===== SECTION =====)
    Section,
    /// Level 2: Subsections and major operations (» Operation)
    Subsection,
    /// Level 3: Progress items and sub-operations
    Progress,
    /// Level 4: Key-value status information
    Status,
}

impl OutputLevel {
    fn indent(&self) -> &'static str {
        match self {
            OutputLevel::Section => "",
            OutputLevel::Subsection => "  ",
            OutputLevel::Progress => "    ",
            OutputLevel::Status => "      ",
        }
    }
}

/// The frame progress bar currently drawn on stderr, if any.
static ACTIVE_PROGRESS: LazyLock<Mutex<Option<ProgressBar>>> = LazyLock::new(|| Mutex::new(None));

fn set_active_progress(bar: Option<ProgressBar>) {
    if let Ok(mut active) = ACTIVE_PROGRESS.lock() {
        *active = bar;
    }
}

/// Returns true while a frame progress bar is drawn.
pub fn progress_active() -> bool {
    ACTIVE_PROGRESS.lock().is_ok_and(|active| active.is_some())
}

/// Runs `f` with the active progress bar (if any) hidden, so that lines
/// written to stderr do not tear the bar.
///
/// Console log sinks should write through this.
pub fn suspend_progress<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let bar = ACTIVE_PROGRESS.lock().ok().and_then(|active| active.clone());
    match bar {
        Some(bar) => bar.suspend(f),
        None => f(),
    }
}

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a section header for major workflow phases
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", title.to_uppercase().cyan());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
    info!("");
}

/// Print an item at the specified hierarchy level
pub fn print_item(level: OutputLevel, symbol: Option<&str>, text: &str, bold: bool) {
    let indent = level.indent();
    let prefix = symbol.map(|s| format!("{s} ")).unwrap_or_default();

    if should_use_color() && bold {
        info!("{indent}{prefix}{}", style(text).bold());
    } else {
        info!("{indent}{prefix}{text}");
    }
}

/// Print a subsection or processing step
pub fn print_processing(message: &str) {
    info!("");
    print_item(OutputLevel::Subsection, Some("»"), message, true);
}

/// Print a sub-item under a processing step
pub fn print_sub_item(message: &str) {
    print_item(OutputLevel::Progress, None, message, false);
}

/// Print a success message
pub fn print_success(message: &str) {
    info!("");
    if should_use_color() {
        info!("  ✓ {}", message.green());
    } else {
        info!("  ✓ {message}");
    }
}

/// Print a status line (key-value pair)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let label_width: usize = 15;
    let padding = label_width.saturating_sub(label.width()).max(1);
    let indent = OutputLevel::Status.indent();

    if !should_use_color() {
        info!("{indent}{label}:{} {value}", " ".repeat(padding));
        return;
    }

    let colored_value = match () {
        () if label.contains("Failed") && value != "0" => value.red().bold().to_string(),
        () if label.contains("Detections") && value == "0" => value.yellow().to_string(),
        () if highlight => value.bold().to_string(),
        () => value.to_string(),
    };
    info!("{indent}{label}:{} {colored_value}", " ".repeat(padding));
}

/// Print an error message
pub fn print_error(title: &str, message: &str, suggestion: Option<&str>) {
    if should_use_color() {
        info!("✗ {}", title.red().bold());
    } else {
        info!("✗ {title}");
    }

    info!("");
    info!("  Message:  {message}");

    if let Some(suggestion_text) = suggestion {
        info!("");
        info!("  Suggestion: {suggestion_text}");
    }

    info!("");
}

/// Print a warning message
pub fn print_warning(message: &str) {
    if should_use_color() {
        info!("  ⚠ {}", message.yellow());
    } else {
        info!("  ⚠ {message}");
    }
}

// ============================================================================
// FRAME PROGRESS
// ============================================================================

/// Progress bar over the frames of one video.
///
/// The bar is only drawn when requested and stderr is a terminal; otherwise
/// it stays hidden and `is_visible` returns false so callers can fall back to
/// periodic log lines. An unknown frame count (0) shows a spinner.
pub struct FrameProgress {
    bar: ProgressBar,
    visible: bool,
}

impl FrameProgress {
    pub fn new(total_frames: u64, enabled: bool) -> Self {
        let visible = enabled && std::io::stderr().is_terminal();
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
                visible,
            };
        }

        let bar = if total_frames > 0 {
            ProgressBar::new(total_frames)
        } else {
            ProgressBar::new_spinner()
        };
        bar.set_style(frame_style(total_frames > 0));
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.enable_steady_tick(Duration::from_millis(100));
        set_active_progress(Some(bar.clone()));

        Self { bar, visible }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Moves the bar to `frames_read`, growing it when the advisory frame
    /// count turns out to be too small.
    pub fn set_position(&self, frames_read: u64, detections: u64) {
        if !self.visible {
            return;
        }
        if let Some(len) = self.bar.length() {
            if len > 0 && frames_read > len {
                self.bar.set_length(frames_read);
            }
        }
        self.bar.set_position(frames_read);
        self.bar.set_message(format!("{detections} detections"));
    }

    /// Removes the bar from the terminal.
    pub fn finish(&self) {
        if self.visible {
            set_active_progress(None);
        }
        self.bar.finish_and_clear();
    }
}

impl Drop for FrameProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.finish();
        }
    }
}

fn frame_style(bounded: bool) -> ProgressStyle {
    let term_width = Term::stderr().size().1 as usize;
    let template = match (bounded, term_width) {
        (true, w) if w >= 100 => {
            "  ⧖ Annotating: {percent:>3}% [{bar:30}] {pos}/{len} frames, {msg} ({elapsed_precise} / {eta_precise})"
        }
        (true, w) if w >= 60 => "  ⧖ Annotating: {percent:>3}% [{bar:20}] {msg}",
        (true, _) => "  ⧖ {percent:>3}% [{bar:10}]",
        (false, _) => "  {spinner} Annotating: {pos} frames, {msg} ({elapsed_precise})",
    };

    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##.")
}
