//! Availability consistency checks over the populated index.
//!
//! Every symbol must have at most one defining location, every declaration
//! must carry well-formed annotations, definitions must carry none, and all
//! declarations of a symbol must agree. Violations are collected, not
//! raised: checking always covers every symbol.

use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

use crate::database::{
    AvailabilityError, Declaration, DeclarationAvailability, HeaderDatabase, Location, Symbol,
};
use crate::util::Diagnostic;

/// A symbol whose declarations break an availability invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("multiple definitions of symbol `{symbol}`")]
    MultipleDefinitions {
        symbol: String,
        first: Location,
        second: Location,
    },

    #[error("failed to calculate availability for declaration of `{symbol}`: {error}")]
    InvalidAvailability {
        symbol: String,
        location: Location,
        error: AvailabilityError,
    },

    #[error("inline definition of `{symbol}` has non-empty versioning information: {availability}")]
    AnnotatedDefinition {
        symbol: String,
        location: Location,
        availability: String,
    },

    #[error("inconsistent availability for symbol `{symbol}`: {error}")]
    InconsistentAvailability {
        symbol: String,
        error: AvailabilityError,
        /// Every declaration location with its own availability.
        declarations: Vec<(Location, String)>,
    },
}

impl ConsistencyError {
    pub fn symbol(&self) -> &str {
        match self {
            ConsistencyError::MultipleDefinitions { symbol, .. }
            | ConsistencyError::InvalidAvailability { symbol, .. }
            | ConsistencyError::AnnotatedDefinition { symbol, .. }
            | ConsistencyError::InconsistentAvailability { symbol, .. } => symbol,
        }
    }

    /// Render with locations relative to `base`.
    pub fn to_diagnostic(&self, base: &Path) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            ConsistencyError::MultipleDefinitions { first, second, .. } => diag
                .with_location(first.relative_to(base))
                .with_location(second.relative_to(base)),
            ConsistencyError::InvalidAvailability { location, .. }
            | ConsistencyError::AnnotatedDefinition { location, .. } => {
                diag.with_location(location.relative_to(base))
            }
            ConsistencyError::InconsistentAvailability { declarations, .. } => declarations
                .iter()
                .fold(diag, |diag, (location, availability)| {
                    diag.with_context(format!("{}: {}", location.relative_to(base), availability))
                }),
        }
    }
}

/// Outcome of [`check_consistency`].
#[derive(Debug, Clone, Default)]
pub struct ConsistencyReport {
    pub symbols_checked: usize,
    pub errors: Vec<ConsistencyError>,
}

impl ConsistencyReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Write every violation, then the overall verdict when something failed.
    pub fn emit(&self, base: &Path, out: &mut dyn Write, color: bool) -> io::Result<()> {
        for error in &self.errors {
            error.to_diagnostic(base).emit(out, color)?;
        }
        if !self.passed() {
            writeln!(out, "versioner: sanity check failed")?;
        }
        Ok(())
    }
}

/// Check every symbol in `database`.
pub fn check_consistency(database: &HeaderDatabase) -> ConsistencyReport {
    let mut report = ConsistencyReport::default();

    for symbol in database.symbols() {
        report.symbols_checked += 1;
        if let Err(e) = check_symbol(symbol) {
            tracing::debug!("{}", e);
            report.errors.push(e);
        }
    }

    tracing::info!(
        "checked {} symbol(s), {} inconsistent",
        report.symbols_checked,
        report.errors.len()
    );
    report
}

// TODO: reject a property given both globally and per-architecture for the
// same symbol (e.g. `introduced_in=21` next to `introduced_in_x86=23`).
fn check_symbol(symbol: &Symbol) -> Result<(), ConsistencyError> {
    let definitions = symbol.definitions();
    if let [first, second, ..] = definitions.as_slice() {
        return Err(ConsistencyError::MultipleDefinitions {
            symbol: symbol.name.clone(),
            first: first.location.clone(),
            second: second.location.clone(),
        });
    }

    let mut merged = DeclarationAvailability::default();
    for decl in symbol.iter() {
        let availability = decl
            .availability()
            .map_err(|error| ConsistencyError::InvalidAvailability {
                symbol: symbol.name.clone(),
                location: decl.location.clone(),
                error,
            })?;

        if decl.is_definition && !availability.empty() {
            return Err(ConsistencyError::AnnotatedDefinition {
                symbol: symbol.name.clone(),
                location: decl.location.clone(),
                availability: availability.to_string(),
            });
        }

        if let Err(error) = merged.merge(&availability) {
            return Err(ConsistencyError::InconsistentAvailability {
                symbol: symbol.name.clone(),
                error,
                declarations: describe(symbol),
            });
        }
    }

    Ok(())
}

fn describe(symbol: &Symbol) -> Vec<(Location, String)> {
    symbol
        .locations()
        .into_iter()
        .map(|(location, summary)| (location.clone(), availability_text(summary.declaration)))
        .collect()
}

fn availability_text(decl: &Declaration) -> String {
    match decl.availability() {
        Ok(availability) => availability.to_string(),
        Err(e) => format!("invalid: {}", e),
    }
}
