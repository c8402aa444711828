//! The C front end seam.
//!
//! A [`Frontend`] turns one [`CompileInvocation`] (one header under one
//! configuration) into a [`TranslationUnit`]: the declarations it found, with
//! source locations, body presence and raw availability annotations, plus a
//! summary of the diagnostics the compiler produced.

pub mod clang;
pub mod invocation;
pub mod scanner;

use std::path::PathBuf;

use anyhow::Result;
use thiserror::Error;

use crate::database::Location;

pub use clang::ClangFrontend;
pub use invocation::CompileInvocation;

/// A front end able to parse one header under one configuration.
pub trait Frontend: Send + Sync {
    /// Parse the invocation's source file.
    ///
    /// An `Err` means the front end could not run at all; compiler
    /// diagnostics are reported through [`TranslationUnit::diagnostics`].
    fn parse(&self, invocation: &CompileInvocation) -> Result<TranslationUnit>;
}

/// Counts of diagnostics produced while compiling a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticSummary {
    pub warnings: usize,
    pub errors: usize,
}

impl DiagnosticSummary {
    /// Whether the unit produced anything at warning severity or above.
    pub fn has_diagnostics(&self) -> bool {
        self.warnings > 0 || self.errors > 0
    }
}

/// A declaration as reported by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDeclaration {
    pub name: String,
    pub location: Location,
    pub is_definition: bool,
    pub annotations: Vec<String>,
}

/// The result of parsing one header.
#[derive(Debug, Clone, Default)]
pub struct TranslationUnit {
    pub source: PathBuf,
    pub declarations: Vec<ParsedDeclaration>,
    pub diagnostics: DiagnosticSummary,
}

impl TranslationUnit {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        TranslationUnit {
            source: source.into(),
            ..Default::default()
        }
    }
}

/// Front end failures that are not compiler diagnostics.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("clang not found\n\nSet `clang` in versioner.toml, pass --clang, or set the CLANG environment variable")]
    ClangNotFound,

    #[error("clang at `{}` does not exist", path.display())]
    ClangMissing { path: PathBuf },

    #[error("`{command}` was terminated before completing")]
    Terminated { command: String },
}
