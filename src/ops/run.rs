//! The full versioner pipeline: plan, compile, check, cross-check.
//!
//! [`plan`] does every environment check (paths, dependency roots, platform
//! tree) so a broken invocation fails before anything is compiled.
//! [`execute`] then runs the phases; all enabled phases always run.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{Arch, CompilationType};
use crate::database::HeaderDatabase;
use crate::frontend::Frontend;
use crate::ops::check::check_consistency;
use crate::ops::compile::{compile_headers, CompileOptions};
use crate::ops::matrix::generate_compilation_types;
use crate::ops::requirements::{collect_all_requirements, CompilationRequirements};
use crate::ops::versions::{check_versions, CheckOptions};
use crate::platform::{parse_platforms, NdkSymbolDatabase};
use crate::util::fs::{require_dir, write_string};

/// Everything a run needs, resolved from the command line and config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Root of the header tree to check
    pub header_dir: PathBuf,

    /// Root of the include dependencies (`common/` and per-arch children)
    pub dependency_dir: Option<PathBuf>,

    /// Root of the platform symbol tree; cross-checking is skipped without it
    pub platform_dir: Option<PathBuf>,

    /// Architectures to check (empty = all)
    pub archs: BTreeSet<Arch>,

    /// API levels to check (empty = all)
    pub levels: BTreeSet<u32>,

    /// Dump the index instead of checking it
    pub dump: bool,

    /// Write the availability export here
    pub export: Option<PathBuf>,

    /// Write the export even if a phase failed
    pub force: bool,

    /// Color consistency diagnostics
    pub color: bool,

    pub compile: CompileOptions,
    pub check: CheckOptions,
}

/// The validated inputs of a run.
#[derive(Debug, Clone)]
pub struct Plan {
    pub types: BTreeSet<CompilationType>,
    pub requirements: BTreeMap<Arch, CompilationRequirements>,
    pub platform: Option<NdkSymbolDatabase>,
}

/// Which phases failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub compile_failed: bool,
    pub consistency_failed: bool,
    pub versions_failed: bool,
}

impl RunSummary {
    pub fn failed(&self) -> bool {
        self.compile_failed || self.consistency_failed || self.versions_failed
    }
}

/// Validate paths and load everything that does not need the front end.
pub fn plan(options: &RunOptions) -> Result<Plan> {
    require_dir(&options.header_dir)?;

    let types = generate_compilation_types(&options.archs, &options.levels);
    tracing::info!("{} configuration(s) selected", types.len());

    let requirements = collect_all_requirements(
        &types,
        &options.header_dir,
        options.dependency_dir.as_deref(),
    )?;

    // Parsed before compiling so a mismatched platform tree fails early.
    let platform = options
        .platform_dir
        .as_deref()
        .map(|dir| parse_platforms(&types, dir))
        .transpose()?;

    Ok(Plan {
        types,
        requirements,
        platform,
    })
}

/// Run every phase of `plan`.
///
/// Check reports go to `out`, consistency violations to `err`.
pub fn execute<F>(
    plan: &Plan,
    options: &RunOptions,
    frontend: &F,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<RunSummary>
where
    F: Frontend + ?Sized,
{
    let base = options.header_dir.as_path();
    let mut summary = RunSummary::default();

    let outcome = compile_headers(
        &plan.types,
        &plan.requirements,
        base,
        frontend,
        &options.compile,
    )?;
    if outcome.failed() {
        summary.compile_failed = true;
        writeln!(err, "versioner: compilation generated warnings or errors")?;
    }

    if options.dump {
        outcome.database.dump(base, out)?;
    } else {
        let consistency = check_consistency(&outcome.database);
        consistency.emit(base, err, options.color)?;
        summary.consistency_failed = !consistency.passed();

        if let Some(ref platform) = plan.platform {
            let versions = check_versions(&plan.types, &outcome.database, platform, options.check);
            versions.emit(base, out, &outcome.database)?;
            summary.versions_failed = !versions.passed();
        }
    }

    if let Some(ref path) = options.export {
        if options.force || !summary.failed() {
            export(&outcome.database, path)?;
        } else {
            tracing::warn!(
                "not writing {} because checks failed (use --force to override)",
                path.display()
            );
        }
    }

    Ok(summary)
}

fn export(database: &HeaderDatabase, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&database.export())
        .context("failed to serialize availability export")?;
    write_string(path, &json)?;
    tracing::info!("wrote availability for {} symbol(s) to {}", database.len(), path.display());
    Ok(())
}
