// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Section headers: pastel cyan / steel blue (matches wok & quench)
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and context: medium grey
    pub const CONTEXT: u8 = 245;
    /// Muted / secondary text: darker grey
    pub const MUTED: u8 = 240;
    /// Status colors.
    pub const RUNNING: u8 = 75;
    pub const COMPLETED: u8 = 71;
    pub const FAILED: u8 = 167;
    pub const CANCELLED: u8 = 137;
    pub const PENDING: u8 = 245;
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

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

fn paint(text: &str, code: u8) -> String {
    if should_colorize() {
        format!("{}{}{}", fg256(code), text, RESET)
    } else {
        text.to_string()
    }
}

/// Format text with the header color (steel blue).
pub fn header(text: &str) -> String {
    paint(text, codes::HEADER)
}

/// Format text with the literal color (light grey).
pub fn literal(text: &str) -> String {
    paint(text, codes::LITERAL)
}

/// Format text with the context color (medium grey).
pub fn context(text: &str) -> String {
    paint(text, codes::CONTEXT)
}

/// Format text with the muted color (darker grey).
pub fn muted(text: &str) -> String {
    paint(text, codes::MUTED)
}

/// Colorize a job status string (`pending`/`running`/`completed`/
/// `failed`/`cancelled`) per its lifecycle meaning.
pub fn status(text: &str) -> String {
    let code = match text {
        "running" => codes::RUNNING,
        "completed" => codes::COMPLETED,
        "failed" => codes::FAILED,
        "cancelled" => codes::CANCELLED,
        _ => codes::PENDING,
    };
    paint(text, code)
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
