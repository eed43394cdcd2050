//! Console rendering and pacing
//!
//! Every line printed by a run goes through one of four tones:
//! bold headers, subdued details, highlighted numbers and noticed payloads.

use std::io::{self, Write};

use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::errors::Result;

/// Color scheme of the console output
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Whether colors are emitted at all
    colored: bool,
}

impl Palette {
    /// Create a colored palette
    pub fn new() -> Self {
        Palette { colored: true }
    }

    /// Create a palette emitting plain text
    pub fn without_colors() -> Self {
        Palette { colored: false }
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Phase headers
    pub fn bold(&self, text: &str) -> String {
        self.paint(text, |t| t.white().bold())
    }

    /// Details and separators
    pub fn subdue(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_black())
    }

    /// Numbers worth looking at
    pub fn highlight(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_yellow())
    }

    /// Payloads and verdicts
    pub fn notice(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_cyan())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::new()
    }
}

/// Print without a newline and make it visible right away
pub fn print_flush(text: &str) -> Result<()> {
    let mut out = io::stdout();
    write!(out, "{}", text)?;
    out.flush()?;
    Ok(())
}

/// Format an integer with comma thousands separators (`1234567` -> `1,234,567`)
pub fn group_thousands(n: impl Into<i128>) -> String {
    let n: i128 = n.into();
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Gate between two phases of a run
pub trait Pacer {
    /// Block until the run may continue
    fn pause(&mut self, message: &str) -> Result<()>;
}

/// Waits for the user to press enter
pub struct PromptPacer {
    editor: DefaultEditor,
    palette: Palette,
}

impl PromptPacer {
    pub fn new(palette: Palette) -> Result<Self> {
        Ok(PromptPacer {
            editor: DefaultEditor::new()?,
            palette,
        })
    }
}

impl Pacer for PromptPacer {
    fn pause(&mut self, message: &str) -> Result<()> {
        let prompt = self.palette.subdue(&format!("--------- paused - enter to {} ", message));
        match self.editor.readline(&prompt) {
            Ok(_) | Err(ReadlineError::Eof) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Never waits
#[derive(Debug, Default)]
pub struct NoPause;

impl Pacer for NoPause {
    fn pause(&mut self, _message: &str) -> Result<()> {
        Ok(())
    }
}
