use flashdrill_lib::catalog::{Mode, MAX_PRIORITY};
use flashdrill_lib::session::GradeBand;
use flashdrill_lib::sync::SyncState;

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Erase the current line and return the cursor to its start
pub const CLEAR_LINE: &str = "\r\x1b[2K";

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn bold(text: &str, use_color: bool) -> String {
    paint(text, Color::BOLD, use_color)
}

pub fn dim(text: &str, use_color: bool) -> String {
    paint(text, Color::DIM, use_color)
}

/// Priority as filled and empty stars, e.g. "★★☆"
pub fn stars(priority: u8) -> String {
    let filled = priority.min(MAX_PRIORITY) as usize;
    let empty = MAX_PRIORITY as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

pub fn mode_color(mode: Mode) -> &'static str {
    match mode {
        Mode::Chunk => Color::GREEN,
        Mode::Collocation => Color::CYAN,
        Mode::Sentence => Color::MAGENTA,
        Mode::Cvc => Color::YELLOW,
    }
}

pub fn sync_badge(state: SyncState, use_color: bool) -> String {
    let color = match state {
        SyncState::Idle => Color::GRAY,
        SyncState::Syncing => Color::BLUE,
        SyncState::Success => Color::GREEN,
        SyncState::Error => Color::RED,
    };
    paint(&format!("[{}]", state), color, use_color)
}

pub fn grade_color(grade: GradeBand) -> &'static str {
    match grade {
        GradeBand::Perfect => Color::GREEN,
        GradeBand::Great => Color::CYAN,
        GradeBand::Good => Color::YELLOW,
        GradeBand::Retry => Color::RED,
    }
}

/// Horizontal bar scaled to `max`
pub fn bar(value: u32, max: u32, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = ((f64::from(value) / f64::from(max)) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}
