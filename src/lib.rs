//! versioner - availability annotation checker for platform C headers
//!
//! This crate compiles a header tree under every (architecture, API level,
//! `off_t` width) configuration, indexes the declarations it finds, checks
//! that their availability annotations are consistent, and cross-checks
//! them against the symbols the platform libraries really export.

pub mod core;
pub mod database;
pub mod frontend;
pub mod ops;
pub mod platform;
pub mod util;

/// Test utilities and mocks for versioner unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a scripted front end and on-disk header tree fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{Arch, CompilationType};
pub use database::{DeclarationAvailability, HeaderDatabase, Symbol};
pub use frontend::{ClangFrontend, Frontend};
pub use platform::NdkSymbolDatabase;
pub use util::config::Config;
