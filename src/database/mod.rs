//! The declaration index.
//!
//! [`HeaderDatabase`] maps every symbol name to all of its declarations,
//! keyed by the configuration under which each was observed. It is filled
//! during compilation and only read afterwards.

pub mod availability;
pub mod declaration;
pub mod symbol;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

pub use availability::{
    AvailabilityError, AvailabilityValues, DeclarationAvailability, Property,
};
pub use declaration::{Declaration, Location};
pub use symbol::Symbol;

use crate::core::CompilationType;
use crate::frontend::TranslationUnit;

/// Every symbol seen across every compiled configuration.
#[derive(Debug, Clone, Default)]
pub struct HeaderDatabase {
    symbols: BTreeMap<String, Symbol>,
}

impl HeaderDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the declarations of one parsed unit into the index.
    ///
    /// Returns the number of declarations recorded.
    pub fn record(&mut self, ty: CompilationType, unit: &TranslationUnit) -> usize {
        for parsed in &unit.declarations {
            self.add(Declaration {
                name: parsed.name.clone(),
                location: parsed.location.clone(),
                is_definition: parsed.is_definition,
                annotations: parsed.annotations.clone(),
                compilation_type: ty,
            });
        }
        unit.declarations.len()
    }

    pub fn add(&mut self, declaration: Declaration) {
        self.symbols
            .entry(declaration.name.clone())
            .or_insert_with(|| Symbol::new(declaration.name.clone()))
            .add(declaration);
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Iterate over symbols in name order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Merged availability of a symbol, if it is known.
    pub fn availability(
        &self,
        name: &str,
    ) -> Option<Result<DeclarationAvailability, AvailabilityError>> {
        self.symbol(name).map(Symbol::availability)
    }

    /// Whether `name` was declared when compiling `ty`.
    pub fn has_declaration(&self, name: &str, ty: &CompilationType) -> bool {
        self.symbol(name).is_some_and(|s| s.has_declaration(ty))
    }

    /// Write every symbol with its merged availability and declarations.
    pub fn dump(&self, base: &Path, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "versioner: dumping {} symbol(s)", self.symbols.len())?;
        for symbol in self.symbols.values() {
            match symbol.availability() {
                Ok(availability) => writeln!(out, "{}: {}", symbol.name, availability)?,
                Err(e) => writeln!(out, "{}: invalid availability ({})", symbol.name, e)?,
            }
            symbol.dump(base, out)?;
        }
        Ok(())
    }

    /// Build the availability export consumed by header rewriting.
    pub fn export(&self) -> AvailabilityExport {
        let symbols = self
            .symbols
            .values()
            .map(|symbol| {
                let (availability, error) = match symbol.availability() {
                    Ok(availability) => (Some(availability), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                (
                    symbol.name.clone(),
                    SymbolExport {
                        availability,
                        error,
                        declared_in: symbol.declared_types(),
                    },
                )
            })
            .collect();
        AvailabilityExport { symbols }
    }
}

/// Serializable view of the database: symbol to merged availability and
/// the configurations that declare it.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityExport {
    pub symbols: BTreeMap<String, SymbolExport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolExport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<DeclarationAvailability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub declared_in: BTreeSet<CompilationType>,
}
