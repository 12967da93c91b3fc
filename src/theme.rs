//! Colors for CLI output.
//!
//! Command handlers format user-facing text through [`Theme`] helpers
//! instead of writing escape codes themselves. Color is disabled when
//! `NO_COLOR` is set or stdout is not a terminal.

/// Terminal colors used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Yellow,
    Gray,
    DarkGray,
    /// No escape codes at all
    Plain,
}

impl Color {
    fn ansi(self) -> &'static str {
        match self {
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Gray => "\x1b[37m",
            Color::DarkGray => "\x1b[90m",
            Color::Plain => "",
        }
    }
}

/// ANSI reset sequence
const ANSI_RESET: &str = "\x1b[0m";

/// Color roles for CLI output.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Most content
    pub text_primary: Color,
    /// Hints and secondary details
    pub text_secondary: Color,
    /// Headings
    pub accent: Color,
    /// Warnings about destructive actions
    pub warning: Color,
    pub success: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text_primary: Color::Gray,
            text_secondary: Color::DarkGray,
            accent: Color::Green,
            warning: Color::Yellow,
            success: Color::Green,
        }
    }
}

impl Theme {
    /// Theme that emits no escape codes.
    pub fn plain() -> Self {
        Self {
            text_primary: Color::Plain,
            text_secondary: Color::Plain,
            accent: Color::Plain,
            warning: Color::Plain,
            success: Color::Plain,
        }
    }

    fn paint(color: Color, text: &str) -> String {
        if color == Color::Plain {
            return text.to_string();
        }
        format!("{}{}{}", color.ansi(), text, ANSI_RESET)
    }

    /// Format text with the accent color.
    pub fn accent_text(&self, text: &str) -> String {
        Self::paint(self.accent, text)
    }

    /// Format text with the primary color.
    pub fn primary_text(&self, text: &str) -> String {
        Self::paint(self.text_primary, text)
    }

    /// Format text with the secondary color.
    pub fn secondary_text(&self, text: &str) -> String {
        Self::paint(self.text_secondary, text)
    }

    /// Format text with the warning color.
    pub fn warning_text(&self, text: &str) -> String {
        Self::paint(self.warning, text)
    }

    /// Format text with the success color.
    pub fn success_text(&self, text: &str) -> String {
        Self::paint(self.success, text)
    }
}

/// Theme for the current process.
pub fn current_theme() -> Theme {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    if no_color || !atty::is(atty::Stream::Stdout) {
        Theme::plain()
    } else {
        Theme::default()
    }
}
