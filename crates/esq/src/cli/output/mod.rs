//! Terminal styling, syntax highlighting, and JSON output for the CLI.
//!
//! Styling is applied only when stdout is a terminal, so piped output is
//! plain text and compiled documents stay machine-readable.

use std::io::{self, IsTerminal};

use esq_query::QueryError;
use serde::Serialize;
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

/// ANSI escape codes for terminal output.
mod ansi {
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Yellow text.
    pub const YELLOW: &str = "\x1b[33m";
    /// Dim text.
    pub const DIM: &str = "\x1b[2m";
    /// Reset all formatting.
    pub const RESET: &str = "\x1b[0m";
}

/// Whether stdout is an interactive terminal.
pub fn is_tty() -> bool {
    io::stdout().is_terminal()
}

/// Wraps `text` in an ANSI style when stdout is a terminal.
fn paint(style: &str, text: &str) -> String {
    if is_tty() {
        format!("{style}{text}{}", ansi::RESET)
    } else {
        text.to_string()
    }
}

/// Formats text as a subheader (bold).
pub fn subheader(text: &str) -> String {
    paint(ansi::BOLD, text)
}

/// Formats text as dimmed/less important.
pub fn dim(text: &str) -> String {
    paint(ansi::DIM, text)
}

/// Formats text as a warning (yellow).
pub fn warning(text: &str) -> String {
    paint(ansi::YELLOW, text)
}

/// Languages the highlighter knows how to color.
#[derive(Clone, Copy)]
pub enum Language {
    /// Compiled query documents.
    Json,
    /// Configuration files and settings.
    Toml,
}

impl Language {
    /// File extension syntect uses to find the syntax definition.
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

/// Syntax highlighter for terminal output.
pub struct Highlighter {
    /// Language definitions.
    syntax_set: SyntaxSet,
    /// Color themes.
    theme_set: EmbeddedLazyThemeSet,
    /// Active theme.
    theme: EmbeddedThemeName,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    /// Creates a highlighter with the Dracula theme.
    pub fn new() -> Self {
        Self {
            syntax_set: extra_syntaxes(),
            theme_set: extra_themes(),
            theme: EmbeddedThemeName::Dracula,
        }
    }

    /// Highlights `content` for a 24-bit color terminal.
    ///
    /// Lines the highlighter cannot parse are emitted unstyled.
    pub fn highlight(&self, content: &str, language: Language) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_extension(language.extension())
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let mut lines = HighlightLines::new(syntax, self.theme_set.get(self.theme));

        let mut output = String::with_capacity(content.len() * 2);
        for line in LinesWithEndings::from(content) {
            let ranges: Vec<(Style, &str)> = lines
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_else(|_| vec![(Style::default(), line)]);
            output.push_str(&as_24_bit_terminal_escaped(&ranges, false));
        }
        output.push_str(ansi::RESET);
        output
    }
}

/// Prints `content`, highlighted when stdout is a terminal.
///
/// A trailing newline is added if `content` lacks one.
pub fn print_source(content: &str, language: Language) {
    let rendered = if is_tty() {
        Highlighter::new().highlight(content, language)
    } else {
        content.to_string()
    };
    print!("{rendered}");
    if !content.ends_with('\n') {
        println!();
    }
}

/// Serializes `value` as JSON and prints it, pretty or compact.
pub fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<(), serde_json::Error> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    print_source(&rendered, Language::Json);
    Ok(())
}

/// Prints a query error with its caret annotation and hint to stderr.
pub fn print_query_error(err: &QueryError) {
    eprintln!("{}", err.to_string().trim_end());
}
