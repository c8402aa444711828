//! The versioner run: resolve inputs, then compile and check.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::cli::Cli;
use versioner::ops::{self, CheckOptions, CompileOptions, RunOptions};
use versioner::util::Config;
use versioner::ClangFrontend;

const VERSIONER_DIR: &str = "bionic/tools/versioner";

/// Header injected by `-i`, under `$ANDROID_BUILD_TOP`, unless the config names another one.
const VERSIONING_HEADER: &str = "bionic/libc/include/android/versioning.h";

/// Inputs resolved from the command line, config and environment.
#[derive(Debug)]
struct Paths {
    header_dir: PathBuf,
    dependency_dir: Option<PathBuf>,
    platform_dir: Option<PathBuf>,
    inject_header: Option<PathBuf>,
}

/// Run the checks. Returns whether any phase failed.
pub fn execute(cli: Cli) -> Result<bool> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let config = Config::discover(cli.config.as_deref(), &cwd)?;

    let build_top = std::env::var_os("ANDROID_BUILD_TOP").map(PathBuf::from);
    let paths = resolve_paths(&cli, &config, build_top)?;

    let options = RunOptions {
        header_dir: paths.header_dir,
        dependency_dir: paths.dependency_dir,
        platform_dir: paths.platform_dir,
        archs: cli.archs.iter().copied().collect(),
        levels: cli.api_levels.iter().copied().collect(),
        dump: cli.dump,
        export: cli.export.clone(),
        force: cli.force,
        color: cli.color.enabled(std::io::stderr().is_terminal()),
        compile: CompileOptions {
            jobs: cli.jobs.unwrap_or_else(|| config.jobs()).max(1),
            inject_header: paths.inject_header,
            extra_flags: config.cflags.clone(),
            progress: !cli.verbose,
        },
        check: CheckOptions {
            verbose: cli.verbose,
        },
    };

    let plan = ops::plan(&options)?;

    let clang = cli.clang.as_deref().or(config.clang.as_deref());
    let frontend = ClangFrontend::detect(clang)?.with_cwd(&options.header_dir);

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let summary = ops::execute(
        &plan,
        &options,
        &frontend,
        &mut stdout.lock(),
        &mut stderr.lock(),
    )?;
    std::io::stdout().flush()?;

    Ok(summary.failed())
}

/// Header, dependency and platform roots, autodetected under
/// `ANDROID_BUILD_TOP` when no header path was given, plus the `-i` header.
fn resolve_paths(cli: &Cli, config: &Config, build_top: Option<PathBuf>) -> Result<Paths> {
    let inject_header = match (cli.inject_header, &config.inject_header, &build_top) {
        (false, _, _) => None,
        (true, Some(header), _) => Some(header.clone()),
        (true, None, Some(top)) => Some(top.join(VERSIONING_HEADER)),
        (true, None, None) => {
            bail!("failed to locate android/versioning.h for -i. Is ANDROID_BUILD_TOP set?")
        }
    };

    let Some(ref header_path) = cli.header_path else {
        let Some(top) = build_top else {
            bail!("failed to autodetect bionic paths. Is ANDROID_BUILD_TOP set?");
        };
        let root = top.join(VERSIONER_DIR);
        tracing::debug!("autodetected versioner root {}", root.display());

        return Ok(Paths {
            header_dir: root.join("current"),
            dependency_dir: Some(root.join("dependencies")),
            platform_dir: Some(cli.platform.clone().unwrap_or_else(|| root.join("platforms"))),
            inject_header,
        });
    };

    let header_dir = std::fs::canonicalize(header_path)
        .with_context(|| format!("failed to stat '{}'", header_path.display()))?;

    Ok(Paths {
        header_dir,
        dependency_dir: cli.deps_path.clone(),
        platform_dir: cli.platform.clone(),
        inject_header,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("versioner").chain(args.iter().copied()))
    }

    #[test]
    fn test_inject_header_defaults_under_build_top() {
        let top = Some(PathBuf::from("/aosp"));
        let paths = resolve_paths(&cli(&["-i"]), &Config::default(), top).unwrap();

        assert_eq!(
            paths.inject_header,
            Some(PathBuf::from("/aosp/bionic/libc/include/android/versioning.h"))
        );
        assert_eq!(paths.header_dir, Path::new("/aosp/bionic/tools/versioner/current"));
    }

    #[test]
    fn test_inject_header_needs_build_top() {
        let dir = std::env::temp_dir();
        let args = ["-i", dir.to_str().unwrap()];

        let err = resolve_paths(&cli(&args), &Config::default(), None).unwrap_err();
        assert!(err.to_string().contains("Is ANDROID_BUILD_TOP set?"));

        let config = Config {
            inject_header: Some(PathBuf::from("/opt/versioning.h")),
            ..Config::default()
        };
        let paths = resolve_paths(&cli(&args), &config, None).unwrap();
        assert_eq!(paths.inject_header, Some(PathBuf::from("/opt/versioning.h")));
    }

    #[test]
    fn test_no_injection_without_flag() {
        let dir = std::env::temp_dir();
        let paths = resolve_paths(&cli(&[dir.to_str().unwrap()]), &Config::default(), None).unwrap();
        assert!(paths.inject_header.is_none());
        assert!(paths.dependency_dir.is_none());
    }
}
