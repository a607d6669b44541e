use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightCyan;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const PASSED: Color = Color::Green;
pub const FAILED: Color = Color::Red;
pub const SKIPPED: Color = Color::Yellow;

pub const ADDRESS: Color = Color::BrightBlue;
