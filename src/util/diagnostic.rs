//! User-facing diagnostic messages.
//!
//! Every reported violation names the symbol and points at the header
//! lines involved so the offending declaration can be found.

use std::fmt;
use std::io::{self, Write};

const ERROR_LABEL: &str = "error";
const ERROR_LABEL_COLORED: &str = "\x1b[1;31merror\x1b[0m";

/// When to color diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Color when the output stream is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Resolve against whether the destination stream is a terminal.
    pub fn enabled(self, is_terminal: bool) -> bool {
        match self {
            ColorChoice::Auto => is_terminal,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// An error with the locations and context that explain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Headline, printed after the `error:` label
    pub message: String,
    /// Source locations, already rendered (`include/foo.h:12:5`)
    pub locations: Vec<String>,
    /// `= ...` lines printed after the locations
    pub context: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            locations: Vec::new(),
            context: Vec::new(),
        }
    }

    /// Add a source location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Render as `error: message`, then one line per location and context entry.
    pub fn format(&self, color: bool) -> String {
        let label = if color { ERROR_LABEL_COLORED } else { ERROR_LABEL };
        let mut output = format!("{}: {}\n", label, self.message);

        for location in &self.locations {
            output.push_str(&format!("  --> {}\n", location));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        output
    }

    /// Write the diagnostic to `out`.
    pub fn emit(&self, out: &mut dyn Write, color: bool) -> io::Result<()> {
        out.write_all(self.format(color).as_bytes())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}
