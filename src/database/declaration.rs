//! Declarations observed while compiling one configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::availability::{AvailabilityError, DeclarationAvailability};
use crate::core::CompilationType;
use crate::util::fs::relative_path;

/// A position in a header file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Location {
            file: file.into(),
            line,
            column,
        }
    }

    /// Display the location with its file relative to `base`.
    pub fn relative_to(&self, base: &Path) -> String {
        format!(
            "{}:{}:{}",
            relative_path(base, &self.file).display(),
            self.line,
            self.column
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// One occurrence of a named symbol in one header, under one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub location: Location,
    /// Whether the occurrence has a body (an inline definition).
    pub is_definition: bool,
    /// Raw `annotate` strings attached to the declaration.
    pub annotations: Vec<String>,
    pub compilation_type: CompilationType,
}

impl Declaration {
    /// Normalize this declaration's annotations.
    pub fn availability(&self) -> Result<DeclarationAvailability, AvailabilityError> {
        DeclarationAvailability::from_annotations(&self.annotations, self.compilation_type.arch)
    }

    pub fn kind(&self) -> &'static str {
        if self.is_definition {
            "definition"
        } else {
            "declaration"
        }
    }

    /// Write a one-line description of the declaration.
    pub fn dump(&self, base: &Path, out: &mut dyn std::io::Write, indent: usize) -> std::io::Result<()> {
        let availability = match self.availability() {
            Ok(availability) => availability.to_string(),
            Err(e) => format!("invalid: {}", e),
        };
        writeln!(
            out,
            "{:indent$}{} {} ({}): {}",
            "",
            self.kind(),
            self.location.relative_to(base),
            self.compilation_type,
            availability,
            indent = indent
        )
    }
}
