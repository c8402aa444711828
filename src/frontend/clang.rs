//! Front end backed by an external clang binary.
//!
//! Each header is run through clang twice: once with `-fsyntax-only` to
//! collect diagnostics, and once with `-E` to get the preprocessed text the
//! declaration scanner works on.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use super::{scanner, CompileInvocation, DiagnosticSummary, Frontend, FrontendError, TranslationUnit};
use crate::util::process::{locate, locate_clang, CommandLine};

static DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|: )(warning|error|fatal error): ").expect("valid regex")
});

/// A [`Frontend`] that shells out to clang.
#[derive(Debug, Clone)]
pub struct ClangFrontend {
    clang: PathBuf,
    cwd: Option<PathBuf>,
}

impl ClangFrontend {
    pub fn new(clang: impl Into<PathBuf>) -> Self {
        ClangFrontend {
            clang: clang.into(),
            cwd: None,
        }
    }

    /// Locate clang: an explicit path, then `$CLANG`, then `PATH`.
    pub fn detect(configured: Option<&Path>) -> Result<Self> {
        let clang = match configured {
            Some(path) if path.exists() => path.to_path_buf(),
            Some(path) => locate(path).ok_or_else(|| FrontendError::ClangMissing {
                path: path.to_path_buf(),
            })?,
            None => locate_clang().ok_or(FrontendError::ClangNotFound)?,
        };

        tracing::debug!("using clang at {}", clang.display());
        Ok(ClangFrontend::new(clang))
    }

    /// Run clang from `cwd`.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    fn command(&self, invocation: &CompileInvocation, mode: &str) -> CommandLine {
        let mut cmd = CommandLine::new(&self.clang)
            .arg(mode)
            .args(invocation.arguments())
            .args(["-x", "c"])
            .arg(&invocation.source);
        if let Some(ref cwd) = self.cwd {
            cmd = cmd.current_dir(cwd);
        }
        cmd
    }
}

impl Frontend for ClangFrontend {
    fn parse(&self, invocation: &CompileInvocation) -> Result<TranslationUnit> {
        let check = self.command(invocation, "-fsyntax-only");
        let output = check.run()?;
        if output.terminated() {
            return Err(FrontendError::Terminated {
                command: check.to_string(),
            }
            .into());
        }

        let mut diagnostics = count_diagnostics(&output.stderr);
        if !output.status.success() && !diagnostics.has_diagnostics() {
            // Failed without a parseable diagnostic (e.g. a driver error).
            diagnostics.errors = 1;
        }

        // Declarations are harvested even when diagnostics were produced.
        let preprocess = self.command(invocation, "-E");
        let output = preprocess.run()?;
        let declarations = scanner::scan(&output.stdout, &invocation.header_root);

        tracing::debug!(
            "{} ({}): {} declaration(s), {} warning(s), {} error(s)",
            invocation.source.display(),
            invocation.compilation_type,
            declarations.len(),
            diagnostics.warnings,
            diagnostics.errors
        );

        Ok(TranslationUnit {
            source: invocation.source.clone(),
            declarations,
            diagnostics,
        })
    }
}

/// Count warnings and errors in clang's stderr.
pub fn count_diagnostics(stderr: &str) -> DiagnosticSummary {
    let mut summary = DiagnosticSummary::default();
    for caps in DIAGNOSTIC.captures_iter(stderr) {
        match &caps[1] {
            "warning" => summary.warnings += 1,
            _ => summary.errors += 1,
        }
    }
    summary
}
