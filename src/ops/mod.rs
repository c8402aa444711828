//! High-level operations.
//!
//! Each phase of a versioner run lives in its own module; [`run`] strings
//! them together.

pub mod check;
pub mod compile;
pub mod matrix;
pub mod requirements;
pub mod run;
pub mod versions;

pub use check::{check_consistency, ConsistencyError, ConsistencyReport};
pub use compile::{compile_headers, CompilationFailure, CompileOptions, CompileOutcome};
pub use matrix::generate_compilation_types;
pub use requirements::{collect_all_requirements, collect_requirements, CompilationRequirements};
pub use run::{execute, plan, Plan, RunOptions, RunSummary};
pub use versions::{check_versions, should_be_available, CheckOptions, VersionReport};
