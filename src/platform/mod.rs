//! Ground truth: which symbols the platform libraries actually export.
//!
//! The platform tree is laid out as
//! `<root>/android-<level>/arch-<arch>/symbols/<lib>.so.{functions,variables}.txt`,
//! one symbol name per line.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::{Arch, CompilationType};
use crate::util::fs::{read_to_string, require_dir};

/// Symbol name to the configurations whose libraries export it.
pub type NdkSymbolDatabase = BTreeMap<String, BTreeSet<CompilationType>>;

const SYMBOL_LIST_SUFFIXES: &[&str] = &[".so.functions.txt", ".so.variables.txt"];

/// Directory holding the symbol lists for one `(arch, level)` pair.
pub fn symbols_dir(root: &Path, arch: Arch, api_level: u32) -> PathBuf {
    root.join(format!("android-{}", api_level))
        .join(format!("arch-{}", arch))
        .join("symbols")
}

/// Read the symbol lists for every configuration in `types`.
pub fn parse_platforms(types: &BTreeSet<CompilationType>, root: &Path) -> Result<NdkSymbolDatabase> {
    require_dir(root).with_context(|| format!("invalid platform root '{}'", root.display()))?;

    let mut database = NdkSymbolDatabase::new();
    let mut cache: BTreeMap<(Arch, u32), BTreeSet<String>> = BTreeMap::new();

    for ty in types {
        let key = (ty.arch, ty.api_level);
        if !cache.contains_key(&key) {
            let symbols = read_symbol_lists(&symbols_dir(root, ty.arch, ty.api_level))?;
            tracing::debug!(
                "platform android-{}/arch-{}: {} symbol(s)",
                ty.api_level,
                ty.arch,
                symbols.len()
            );
            cache.insert(key, symbols);
        }

        for symbol in &cache[&key] {
            database.entry(symbol.clone()).or_default().insert(*ty);
        }
    }

    tracing::info!("loaded {} platform symbol(s)", database.len());
    Ok(database)
}

fn read_symbol_lists(dir: &Path) -> Result<BTreeSet<String>> {
    if !dir.is_dir() {
        bail!("missing platform symbol directory '{}'", dir.display());
    }

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to open platform directory '{}'", dir.display()))?;

    let mut symbols = BTreeSet::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read directory: {}", dir.display()))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !SYMBOL_LIST_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            continue;
        }

        symbols.extend(parse_symbol_list(&read_to_string(&entry.path())?));
    }
    Ok(symbols)
}

/// Parse one symbol list: one name per line, `#` comments and blanks skipped.
pub fn parse_symbol_list(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}
