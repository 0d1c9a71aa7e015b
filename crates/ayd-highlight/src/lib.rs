//! Terminal styling for AskYourDocs.
//!
//! [`Highlighter`] colors YAML configuration. [`Palette`] applies the small
//! set of ANSI styles used by the CLI, and renders everything plain when color
//! is turned off so piped output stays clean.

#![warn(missing_docs)]

use syntect::{
    easy::HighlightLines,
    highlighting::Style,
    parsing::SyntaxSet,
    util::{LinesWithEndings, as_24_bit_terminal_escaped},
};
use two_face::{
    syntax::extra_newlines as extra_syntaxes,
    theme::{EmbeddedLazyThemeSet, EmbeddedThemeName, extra as extra_themes},
};

/// Highlights source text with 24-bit terminal escapes.
pub struct Highlighter {
    /// Syntax definitions, including the two-face extras.
    syntax_set: SyntaxSet,
    /// Color themes.
    theme_set: EmbeddedLazyThemeSet,
    /// Theme in use.
    theme: EmbeddedThemeName,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    /// Creates a highlighter using the Dracula theme.
    pub fn new() -> Self {
        Self {
            syntax_set: extra_syntaxes(),
            theme_set: extra_themes(),
            theme: EmbeddedThemeName::Dracula,
        }
    }

    /// Highlights YAML.
    pub fn highlight_yaml(&self, content: &str) -> String {
        self.highlight(content, "yaml")
    }

    /// Highlights `content` as the syntax with the given extension or name.
    ///
    /// Unknown syntaxes are treated as plain text.
    pub fn highlight(&self, content: &str, syntax_name: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_extension(syntax_name)
            .or_else(|| self.syntax_set.find_syntax_by_name(syntax_name))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut lines = HighlightLines::new(syntax, self.theme_set.get(self.theme));
        let mut output = String::with_capacity(content.len() * 2);
        for line in LinesWithEndings::from(content) {
            let ranges: Vec<(Style, &str)> = lines
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_else(|_| vec![(Style::default(), line)]);
            output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
        }
        output.push_str(colors::RESET);
        output
    }
}

/// ANSI escape codes.
pub mod colors {
    /// Bold.
    pub const BOLD: &str = "\x1b[1m";
    /// Cyan.
    pub const CYAN: &str = "\x1b[36m";
    /// Green.
    pub const GREEN: &str = "\x1b[32m";
    /// Yellow.
    pub const YELLOW: &str = "\x1b[33m";
    /// Red.
    pub const RED: &str = "\x1b[31m";
    /// Dim.
    pub const DIM: &str = "\x1b[2m";
    /// Reset all attributes.
    pub const RESET: &str = "\x1b[0m";
}

/// Styles for CLI output, or plain text when disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Whether escapes are emitted.
    enabled: bool,
}

impl Palette {
    /// A palette that emits escapes only if `enabled`.
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A palette that never emits escapes.
    pub const fn plain() -> Self {
        Self::new(false)
    }

    /// Returns true if escapes are emitted.
    pub const fn enabled(self) -> bool {
        self.enabled
    }

    /// Wraps `text` in the given escape codes.
    fn paint(self, codes: &[&str], text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        format!("{}{text}{}", codes.concat(), colors::RESET)
    }

    /// Bold cyan, for section titles.
    pub fn header(self, text: &str) -> String {
        self.paint(&[colors::BOLD, colors::CYAN], text)
    }

    /// Bold.
    pub fn subheader(self, text: &str) -> String {
        self.paint(&[colors::BOLD], text)
    }

    /// Dimmed, for secondary details.
    pub fn dim(self, text: &str) -> String {
        self.paint(&[colors::DIM], text)
    }

    /// Green.
    pub fn success(self, text: &str) -> String {
        self.paint(&[colors::GREEN], text)
    }

    /// Yellow.
    pub fn warning(self, text: &str) -> String {
        self.paint(&[colors::YELLOW], text)
    }

    /// Bold red.
    pub fn error(self, text: &str) -> String {
        self.paint(&[colors::BOLD, colors::RED], text)
    }

    /// A dimmed horizontal rule.
    pub fn rule(self, width: usize) -> String {
        self.dim(&"─".repeat(width))
    }

    /// Highlights YAML when enabled, otherwise returns it unchanged.
    pub fn yaml(self, content: &str) -> String {
        if self.enabled {
            Highlighter::new().highlight_yaml(content)
        } else {
            content.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_is_highlighted() {
        let output = Highlighter::new().highlight_yaml("model:\n  provider: ollama\n  temperature: 0.1\n");
        assert!(output.contains("\x1b[38;2;"));
        assert!(output.contains("provider"));
        assert!(output.ends_with(colors::RESET));
    }

    #[test]
    fn unknown_syntax_falls_back_to_plain_text() {
        let output = Highlighter::new().highlight("just words", "no-such-syntax");
        assert!(output.contains("just words"));
    }

    #[test]
    fn yaml_syntax_available() {
        assert!(extra_syntaxes().find_syntax_by_extension("yaml").is_some());
    }

    #[test]
    fn enabled_palette_wraps_text() {
        let palette = Palette::new(true);
        let h = palette.header("AskYourDocs Status");
        assert!(h.starts_with(colors::BOLD));
        assert!(h.contains(colors::CYAN));
        assert!(h.ends_with(colors::RESET));
        assert!(palette.warning("stale").contains(colors::YELLOW));
        assert!(palette.success("done").contains(colors::GREEN));
    }

    #[test]
    fn plain_palette_leaves_text_alone() {
        let palette = Palette::plain();
        assert_eq!(palette.header("Title"), "Title");
        assert_eq!(palette.dim("faint"), "faint");
        assert_eq!(palette.rule(3), "───");
        assert_eq!(palette.yaml("a: 1\n"), "a: 1\n");
    }
}
