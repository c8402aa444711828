//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use versioner::core::arch::SUPPORTED_LEVELS;
use versioner::util::ColorChoice;
use versioner::Arch;

/// Check API availability annotations in platform headers
#[derive(Parser)]
#[command(name = "versioner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Header tree to check (autodetected from ANDROID_BUILD_TOP if omitted)
    pub header_path: Option<PathBuf>,

    /// Include dependencies, with `common/` and per-architecture children
    pub deps_path: Option<PathBuf>,

    /// API level to check (repeatable; defaults to all supported levels)
    #[arg(short = 'a', long = "api-level", value_name = "LEVEL", value_parser = parse_api_level)]
    pub api_levels: Vec<u32>,

    /// Architecture to check (repeatable; defaults to all architectures)
    #[arg(short = 'r', long = "arch", value_name = "ARCH")]
    pub archs: Vec<Arch>,

    /// Platform symbol tree to cross-check availability against
    #[arg(short, long, value_name = "DIR")]
    pub platform: Option<PathBuf>,

    /// Enable verbose output (also reports symbols available earlier than declared)
    #[arg(short, long)]
    pub verbose: bool,

    /// Dump the symbol index instead of checking it
    #[arg(short, long)]
    pub dump: bool,

    /// Write merged availability as JSON for header rewriting
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Write the export even if checks failed
    #[arg(long, requires = "export")]
    pub force: bool,

    /// Number of configurations compiled in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Path to clang
    #[arg(long, value_name = "PATH", env = "CLANG")]
    pub clang: Option<PathBuf>,

    /// Color diagnostics: auto, always or never
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Configuration file (defaults to ./versioner.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Force-include <android/versioning.h> into every header
    #[arg(short = 'i', long, hide = true)]
    pub inject_header: bool,
}

fn parse_api_level(s: &str) -> Result<u32, String> {
    let level: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid API level", s))?;
    if !SUPPORTED_LEVELS.contains(&level) {
        let supported: Vec<String> = SUPPORTED_LEVELS.iter().map(|l| l.to_string()).collect();
        return Err(format!(
            "API level {} is not supported (supported: {})",
            level,
            supported.join(", ")
        ));
    }
    Ok(level)
}
