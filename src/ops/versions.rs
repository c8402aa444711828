//! Cross-check header availability against the platform libraries.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::Path;

use crate::core::compilation_type::join_types;
use crate::core::CompilationType;
use crate::database::{DeclarationAvailability, HeaderDatabase, Symbol};
use crate::platform::NdkSymbolDatabase;

/// Options for [`check_versions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Report (and fail on) symbols the headers hide but the libraries export.
    pub verbose: bool,
}

/// Mismatches between declared and actual availability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionReport {
    /// Declared symbols that no platform library exports at all.
    pub completely_unavailable: BTreeSet<String>,
    /// Declared available, but missing from the platform.
    pub missing: BTreeMap<String, BTreeSet<CompilationType>>,
    /// Declared unavailable, but exported by the platform.
    pub extra: BTreeMap<String, BTreeSet<CompilationType>>,
    /// Symbols whose merged availability could not be computed.
    pub skipped: BTreeSet<String>,
    pub options: CheckOptions,
}

impl VersionReport {
    pub fn passed(&self) -> bool {
        self.missing.is_empty() && !(self.options.verbose && !self.extra.is_empty())
    }

    /// Symbols with at least one reported mismatch, in name order.
    pub fn failing_symbols(&self) -> BTreeSet<&str> {
        let mut symbols: BTreeSet<&str> = self.missing.keys().map(String::as_str).collect();
        if self.options.verbose {
            symbols.extend(self.extra.keys().map(String::as_str));
        }
        symbols
    }

    /// Write each mismatch followed by a dump of the offending symbol.
    pub fn emit(&self, base: &Path, out: &mut dyn Write, database: &HeaderDatabase) -> io::Result<()> {
        if self.options.verbose {
            for name in &self.completely_unavailable {
                writeln!(out, "{}: declared but not present in any platform library", name)?;
            }
        }

        for name in self.failing_symbols() {
            if let Some(types) = self.missing.get(name) {
                writeln!(
                    out,
                    "{}: declaration marked available but symbol missing in [{}]",
                    name,
                    join_types(types)
                )?;
            }
            if self.options.verbose {
                if let Some(types) = self.extra.get(name) {
                    writeln!(
                        out,
                        "{}: declaration marked unavailable but symbol available in [{}]",
                        name,
                        join_types(types)
                    )?;
                }
            }
            if let Some(symbol) = database.symbol(name) {
                symbol.dump(base, out)?;
            }
        }

        if !self.passed() {
            writeln!(out, "versioner: version check failed")?;
        }
        Ok(())
    }
}

/// Whether `symbol` should be exported for `ty`, or `None` when the
/// configuration is exempt from checking.
pub fn should_be_available(
    symbol: &Symbol,
    availability: &DeclarationAvailability,
    ty: &CompilationType,
) -> Option<bool> {
    let global = &availability.global;
    let arch = availability.for_arch(ty.arch);
    let level = ty.api_level;

    let mut available = true;
    if global.introduced.is_some_and(|v| v > level) || arch.introduced.is_some_and(|v| v > level) {
        available = false;
    }
    if global.obsoleted.is_some_and(|v| v <= level) || arch.obsoleted.is_some_and(|v| v <= level) {
        available = false;
    }

    // Future symbols are never validated.
    if arch.future {
        return None;
    }

    // A declaration may legitimately exist for only some configurations.
    if !symbol.has_declaration(ty) {
        available = false;
    }

    Some(available)
}

/// Compare every symbol of `database` against `ndk` for every configuration.
///
/// Pure: the result depends only on the arguments.
pub fn check_versions(
    types: &BTreeSet<CompilationType>,
    database: &HeaderDatabase,
    ndk: &NdkSymbolDatabase,
    options: CheckOptions,
) -> VersionReport {
    let mut report = VersionReport {
        options,
        ..VersionReport::default()
    };

    for symbol in database.symbols() {
        let availability = match symbol.availability() {
            Ok(availability) => availability,
            Err(e) => {
                tracing::warn!("skipping version check for `{}`: {}", symbol.name, e);
                report.skipped.insert(symbol.name.clone());
                continue;
            }
        };

        let Some(platform) = ndk.get(&symbol.name) else {
            report.completely_unavailable.insert(symbol.name.clone());
            continue;
        };

        for ty in types {
            let Some(expected) = should_be_available(symbol, &availability, ty) else {
                continue;
            };
            let actual = platform.contains(ty);

            match (expected, actual) {
                (true, false) => {
                    report.missing.entry(symbol.name.clone()).or_default().insert(*ty);
                }
                (false, true) => {
                    report.extra.entry(symbol.name.clone()).or_default().insert(*ty);
                }
                _ => {}
            }
        }
    }

    tracing::info!(
        "version check: {} missing, {} extra, {} not in any platform library",
        report.missing.len(),
        report.extra.len(),
        report.completely_unavailable.len()
    );
    report
}
