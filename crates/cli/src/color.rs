// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Section and table headers: steel blue
    pub const HEADER: u8 = 74;
    /// Flags and literals in help output: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and placeholders: medium grey
    pub const CONTEXT: u8 = 245;
    /// Secondary text and empty cells: darker grey
    pub const MUTED: u8 = 240;
    /// Active units
    pub const GOOD: u8 = 114;
    /// Failed units
    pub const BAD: u8 = 167;
    /// Paused units
    pub const WARN: u8 = 179;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}

fn paint(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("\x1b[38;5;{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

pub fn muted(text: &str) -> String {
    paint(codes::MUTED, text)
}

/// Color a unit or VM state word by how healthy it is.
pub fn state(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("active") || lower == "running" || lower == "registered" {
        paint(codes::GOOD, text)
    } else if lower.starts_with("failed") {
        paint(codes::BAD, text)
    } else if lower == "paused" {
        paint(codes::WARN, text)
    } else {
        paint(codes::CONTEXT, text)
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
