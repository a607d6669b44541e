use colored::*;
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::terminal::colors;
use crate::terminal::logging::PRINT_TARGET;

pub const TOTAL_WIDTH: usize = 64;

/// A key and its already coloured value.
pub type Row = (String, ColoredString);

#[macro_export]
macro_rules! mprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn banner(q_level: u8) {
    if q_level > 0 {
        return;
    }

    let title = format!("sfcheck v{}", env!("CARGO_PKG_VERSION"));
    print(&format!(
        "{} {}",
        title.color(colors::PRIMARY).bold(),
        "DHCP placement checks for shakenfist".color(colors::SEPARATOR)
    ));
    rule();
}

/// `── TITLE ─────` padded out to [`TOTAL_WIDTH`].
pub fn header(title: &str, q_level: u8) {
    if q_level > 0 {
        return;
    }

    let title = title.to_uppercase();
    let fill = TOTAL_WIDTH.saturating_sub(UnicodeWidthStr::width(title.as_str()) + 4);
    print(&format!(
        "{} {} {}",
        "──".color(colors::SEPARATOR),
        title.color(colors::ACCENT).bold(),
        "─".repeat(fill).color(colors::SEPARATOR)
    ));
}

pub fn rule() {
    print(&"═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR).to_string());
}

/// Prints `key....: value` rows with the colons lined up across the block.
pub fn aligned(rows: &[Row]) {
    let width = key_width(rows);
    for (key, value) in rows {
        print(&format!(
            "{} {}{} {}",
            ">".color(colors::SEPARATOR),
            key.color(colors::PRIMARY),
            leader(key, width).color(colors::SEPARATOR),
            value
        ));
    }
}

/// A name followed by its details as a one-level tree.
pub fn tree(name: &str, rows: &[Row]) {
    print(&format!(
        "{} {}",
        "●".color(colors::ACCENT),
        name.color(colors::PRIMARY).bold()
    ));

    let width = key_width(rows);
    for (i, (key, value)) in rows.iter().enumerate() {
        let branch = if i + 1 == rows.len() { "└─" } else { "├─" };
        print(&format!(
            "  {} {}{} {}",
            branch.color(colors::SEPARATOR),
            key.color(colors::TEXT_DEFAULT),
            leader(key, width).color(colors::SEPARATOR),
            value
        ));
    }
}

pub fn centerln(msg: &str) {
    let pad = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    print(&format!("{pad}{msg}"));
}

fn key_width(rows: &[Row]) -> usize {
    rows.iter()
        .map(|(key, _)| UnicodeWidthStr::width(key.as_str()))
        .max()
        .unwrap_or(0)
}

/// Dots and a colon taking `key` to one column past `width`.
fn leader(key: &str, width: usize) -> String {
    let dots = (width + 1).saturating_sub(UnicodeWidthStr::width(key));
    format!("{}:", ".".repeat(dots))
}
