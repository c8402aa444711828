//! A named symbol and every declaration of it across all configurations.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use super::availability::{AvailabilityError, DeclarationAvailability};
use super::declaration::{Declaration, Location};
use crate::core::CompilationType;

/// All declarations of one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub declarations: BTreeMap<CompilationType, Vec<Declaration>>,
}

/// Declarations sharing one source location, with the configurations that saw them.
#[derive(Debug, Clone)]
pub struct LocationSummary<'a> {
    pub declaration: &'a Declaration,
    pub types: BTreeSet<CompilationType>,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            declarations: BTreeMap::new(),
        }
    }

    /// Record a declaration. A location already seen under the same
    /// configuration (a header reached through several includes) is kept once.
    pub fn add(&mut self, declaration: Declaration) {
        let decls = self
            .declarations
            .entry(declaration.compilation_type)
            .or_default();
        if !decls.iter().any(|d| d.location == declaration.location) {
            decls.push(declaration);
        }
    }

    /// Iterate over every declaration, ordered by configuration.
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values().flatten()
    }

    /// Whether the symbol was declared when compiling `ty`.
    pub fn has_declaration(&self, ty: &CompilationType) -> bool {
        self.declarations.get(ty).is_some_and(|decls| !decls.is_empty())
    }

    /// Configurations under which the symbol was declared.
    pub fn declared_types(&self) -> BTreeSet<CompilationType> {
        self.declarations
            .iter()
            .filter(|(_, decls)| !decls.is_empty())
            .map(|(ty, _)| *ty)
            .collect()
    }

    /// Declarations grouped by source location.
    pub fn locations(&self) -> BTreeMap<&Location, LocationSummary<'_>> {
        let mut result: BTreeMap<&Location, LocationSummary<'_>> = BTreeMap::new();
        for decl in self.iter() {
            result
                .entry(&decl.location)
                .or_insert_with(|| LocationSummary {
                    declaration: decl,
                    types: BTreeSet::new(),
                })
                .types
                .insert(decl.compilation_type);
        }
        result
    }

    /// One declaration per distinct defining location.
    pub fn definitions(&self) -> Vec<&Declaration> {
        self.locations()
            .into_values()
            .map(|summary| summary.declaration)
            .filter(|decl| decl.is_definition)
            .collect()
    }

    /// Merge the availability of every declaration.
    pub fn availability(&self) -> Result<DeclarationAvailability, AvailabilityError> {
        let mut result = DeclarationAvailability::default();
        for decl in self.iter() {
            result.merge(&decl.availability()?)?;
        }
        Ok(result)
    }

    /// Write the symbol and its declarations, one line per source location.
    pub fn dump(&self, base: &Path, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "  {}:", self.name)?;
        for (location, summary) in self.locations() {
            let availability = match summary.declaration.availability() {
                Ok(availability) => availability.to_string(),
                Err(e) => format!("invalid: {}", e),
            };
            writeln!(
                out,
                "    {} {}: {} (in {} configuration{})",
                summary.declaration.kind(),
                location.relative_to(base),
                availability,
                summary.types.len(),
                if summary.types.len() == 1 { "" } else { "s" }
            )?;
        }
        Ok(())
    }
}
