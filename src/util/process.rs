//! Running external tools with captured output.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};

/// A program and its arguments.
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

/// Output of a finished command, decoded lossily.
#[derive(Debug, Clone)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// True when the process was killed rather than exiting.
    pub fn terminated(&self) -> bool {
        self.status.code().is_none()
    }
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandLine {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Run to completion with stdin closed and both output streams captured.
    pub fn run(&self) -> Result<Captured> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd
            .output()
            .with_context(|| format!("failed to run `{}`", self.program.display()))?;

        Ok(Captured {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Resolve `program` through `PATH` (or check it, if it is a path).
pub fn locate(program: impl AsRef<OsStr>) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Find clang: `$CLANG` first, then `clang` on `PATH`.
pub fn locate_clang() -> Option<PathBuf> {
    std::env::var_os("CLANG")
        .and_then(locate)
        .or_else(|| locate("clang"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let captured = CommandLine::new("echo").arg("hello").run().unwrap();

        assert!(captured.status.success());
        assert!(!captured.terminated());
        assert_eq!(captured.stdout.trim(), "hello");
    }

    #[test]
    fn test_display() {
        let cmd = CommandLine::new("clang").arg("-fsyntax-only").args(["-x", "c", "stdio.h"]);

        assert_eq!(cmd.to_string(), "clang -fsyntax-only -x c stdio.h");
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let err = CommandLine::new("/nonexistent/clang-404").run().unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }

    #[test]
    fn test_locate_missing_path() {
        assert!(locate("/nonexistent/bin/clang").is_none());
    }
}
