//! Core data structures for versioner.
//!
//! - Architectures and their platform constants
//! - Compilation types (one point of the configuration matrix)

pub mod arch;
pub mod compilation_type;

pub use arch::{supported_archs, supported_levels, Arch, ArchParseError};
pub use compilation_type::CompilationType;
