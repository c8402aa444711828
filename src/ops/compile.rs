//! Compile every header under every configuration and build the index.
//!
//! Configurations are compiled on a bounded rayon pool. Workers parse
//! without sharing state and only take the lock to fold a finished
//! configuration into the shared [`HeaderDatabase`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::core::{Arch, CompilationType};
use crate::database::HeaderDatabase;
use crate::frontend::{CompileInvocation, Frontend, TranslationUnit};
use crate::ops::requirements::CompilationRequirements;
use crate::util::config::DEFAULT_JOBS;

/// Options for [`compile_headers`].
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Number of configurations compiled concurrently
    pub jobs: usize,

    /// Header force-included into every compile
    pub inject_header: Option<PathBuf>,

    /// Extra front-end flags
    pub extra_flags: Vec<String>,

    /// Show a progress bar
    pub progress: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            jobs: DEFAULT_JOBS,
            inject_header: None,
            extra_flags: Vec::new(),
            progress: false,
        }
    }
}

/// A header that did not compile cleanly under one configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompilationFailure {
    pub compilation_type: CompilationType,
    pub source: PathBuf,
    pub reason: String,
}

impl fmt::Display for CompilationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compilation failure for {} in {}: {}",
            self.compilation_type,
            self.source.display(),
            self.reason
        )
    }
}

/// The populated index plus every configuration/header that failed.
#[derive(Debug, Default)]
pub struct CompileOutcome {
    pub database: HeaderDatabase,
    pub failures: Vec<CompilationFailure>,
}

impl CompileOutcome {
    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Default)]
struct Shared {
    database: HeaderDatabase,
    failures: Vec<CompilationFailure>,
}

/// Compile every applicable header for every configuration in `types`.
///
/// A failing header does not stop the run: it is recorded, and whatever the
/// front end did manage to parse is still merged.
pub fn compile_headers<F>(
    types: &BTreeSet<CompilationType>,
    requirements: &BTreeMap<Arch, CompilationRequirements>,
    header_root: &Path,
    frontend: &F,
    options: &CompileOptions,
) -> Result<CompileOutcome>
where
    F: Frontend + ?Sized,
{
    let work: Vec<(CompilationType, &CompilationRequirements)> = types
        .iter()
        .map(|ty| {
            requirements
                .get(&ty.arch)
                .map(|reqs| (*ty, reqs))
                .ok_or_else(|| anyhow!("no compile requirements collected for {}", ty.arch))
        })
        .collect::<Result<_>>()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.max(1))
        .build()
        .context("failed to start compile workers")?;

    tracing::info!(
        "compiling {} configuration(s) with {} worker(s)",
        work.len(),
        options.jobs.max(1)
    );

    let progress = progress_bar(work.len(), options.progress);
    let shared = Mutex::new(Shared::default());

    pool.install(|| {
        work.par_iter().for_each(|(ty, reqs)| {
            let results = compile_configuration(*ty, reqs, header_root, frontend, options);

            let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
            for (source, result) in results {
                match result {
                    Ok(unit) => {
                        shared.database.record(*ty, &unit);
                        if unit.diagnostics.has_diagnostics() {
                            let reason = format!(
                                "{} warning(s), {} error(s)",
                                unit.diagnostics.warnings, unit.diagnostics.errors
                            );
                            shared.failures.push(failure(&progress, *ty, source, reason));
                        }
                    }
                    Err(e) => {
                        let reason = format!("{:#}", e);
                        shared.failures.push(failure(&progress, *ty, source, reason));
                    }
                }
            }
            progress.inc(1);
        });
    });

    progress.finish_and_clear();

    let Shared {
        database,
        mut failures,
    } = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
    failures.sort();

    tracing::info!(
        "indexed {} symbol(s), {} compilation failure(s)",
        database.len(),
        failures.len()
    );

    Ok(CompileOutcome { database, failures })
}

fn compile_configuration<F>(
    ty: CompilationType,
    reqs: &CompilationRequirements,
    header_root: &Path,
    frontend: &F,
    options: &CompileOptions,
) -> Vec<(PathBuf, Result<TranslationUnit>)>
where
    F: Frontend + ?Sized,
{
    tracing::debug!("compiling {} ({} header(s))", ty, reqs.headers.len());

    reqs.headers
        .iter()
        .map(|header| {
            let invocation = CompileInvocation::new(
                ty,
                header,
                header_root,
                reqs.dependencies.clone(),
            )
            .with_inject_header(options.inject_header.as_deref())
            .with_extra_flags(&options.extra_flags);

            (header.clone(), frontend.parse(&invocation))
        })
        .collect()
}

fn failure(
    progress: &ProgressBar,
    compilation_type: CompilationType,
    source: PathBuf,
    reason: String,
) -> CompilationFailure {
    progress.suspend(|| {
        tracing::error!(
            "compilation failure for {} in {}: {}",
            compilation_type,
            source.display(),
            reason
        )
    });
    CompilationFailure {
        compilation_type,
        source,
        reason,
    }
}

fn progress_bar(total: usize, enabled: bool) -> ProgressBar {
    if !enabled || total <= 1 {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} configurations")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
